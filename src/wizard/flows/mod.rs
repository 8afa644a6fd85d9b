pub mod module_upload;
pub mod reset_password;
pub mod signup;

pub use module_upload::{ModuleUploadFlow, UploadStep};
pub use reset_password::{ResetPasswordFlow, ResetStep};
pub use signup::{SignupFlow, SignupStep};
