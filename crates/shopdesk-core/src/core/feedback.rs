/// Shared user-feedback channel (toasts in a UI, stderr lines in the CLI).
pub trait Feedback: Send + Sync {
    fn error(&self, message: &str);
    fn success(&self, message: &str);
}
