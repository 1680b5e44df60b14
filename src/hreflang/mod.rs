pub mod detect;
pub mod resolver;
pub mod sync;
pub mod validator;

pub use detect::{detect_content_language, detect_language, language_or_default};
pub use resolver::{choose_x_default, HreflangResolver};
pub use sync::{GroupSynchronizer, SaveRequest, SyncReport};
pub use validator::{ValidationReport, ValidationStatus, Validator};
