//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて submit のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskSubmitterBuilder**: submitter の構築とワイヤリング
//! - **TaskSubmitter**: materialize → schedule → name → guard → create_task
//! - **RequestMaterializer**: 型付き request を URL / headers / body に変換
//! - **DedupGuard**: プロセス内の重複投入ガード
//! - **EncoderTable**: encoding kind ごとの body encoder

pub mod builder;
pub mod dedup;
pub mod encoding;
pub mod materializer;
pub mod submitter;
pub mod url;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, TaskSubmitterBuilder};
pub use self::dedup::DedupGuard;
pub use self::encoding::{BodyEncoder, EncoderTable};
pub use self::materializer::RequestMaterializer;
pub use self::submitter::TaskSubmitter;
