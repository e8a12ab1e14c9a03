//! In-memory [`ChainClient`] for tests

use crate::client::{ChainClient, SubmissionResult, SubmissionStatus};
use crate::error::SubmissionError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every submitted call; optionally fails the n-th submission (0-based)
#[derive(Default)]
pub(crate) struct MockClient {
    submitted: Mutex<Vec<Vec<u8>>>,
    fail_on: Option<usize>,
    pots: Vec<u32>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(submission: usize) -> Self {
        Self {
            fail_on: Some(submission),
            ..Self::default()
        }
    }

    pub(crate) fn with_pots(pots: &[u32]) -> Self {
        Self {
            pots: pots.to_vec(),
            ..Self::default()
        }
    }

    pub(crate) fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub(crate) fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockClient {
    async fn submit_call(&self, call: &[u8]) -> Result<SubmissionResult, SubmissionError> {
        let n = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(call.to_vec());
            submitted.len() - 1
        };
        if self.fail_on == Some(n) {
            return Err(SubmissionError::Rejected("injected failure".to_string()));
        }
        Ok(SubmissionResult {
            status: SubmissionStatus::Finalized,
            block_hash: Some(format!("0x{:064x}", n + 1)),
            extrinsic_hash: None,
            error_detail: None,
        })
    }

    async fn pot_exists(&self, pot_id: u32) -> Result<bool, SubmissionError> {
        Ok(self.pots.contains(&pot_id))
    }
}
