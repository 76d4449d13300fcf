// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while reconciling workers
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("runner has been stopped")]
    Stopped,

    #[error("failed to start worker: {0}")]
    WorkerStart(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RunnerError::WorkerStart("no client handle".to_string());
        assert_eq!(
            error.to_string(),
            "failed to start worker: no client handle"
        );
    }

    #[test]
    fn test_error_debug() {
        let error = RunnerError::Stopped;
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Stopped"));
    }
}
