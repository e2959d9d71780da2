//! External process invocation.
//!
//! The conversion and unpack scripts shell out to an external executable
//! per file and look only at its exit code. That narrow contract is the
//! ProcessInvoker trait; SystemInvoker is the real implementation over
//! `std::process::Command`, and tests substitute a fake.

use std::io;
use std::process::Command;

/// Runs an external executable and reports its exit code.
pub trait ProcessInvoker {
    /// Runs `program` with `args`, waits for it to finish, and returns
    /// the exit code. A process killed by a signal reports -1.
    fn invoke(&mut self, program: &str, args: &[String]) -> io::Result<i32>;
}

/// Invoker backed by `std::process::Command`.
pub struct SystemInvoker;

impl ProcessInvoker for SystemInvoker {
    fn invoke(&mut self, program: &str, args: &[String]) -> io::Result<i32> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_reports_exit_code() {
        let mut invoker = SystemInvoker;
        let code = invoker
            .invoke("sh", &["-c".to_string(), "exit 3".to_string()])
            .expect("Failed to run shell");
        assert_eq!(code, 3);
    }

    #[test]
    fn test_invoke_success_is_zero() {
        let mut invoker = SystemInvoker;
        let code = invoker
            .invoke("sh", &["-c".to_string(), "true".to_string()])
            .expect("Failed to run shell");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_missing_program_errors() {
        let mut invoker = SystemInvoker;
        let result = invoker.invoke("definitely-not-a-real-program-9f8e7d", &[]);
        assert!(result.is_err());
    }
}
