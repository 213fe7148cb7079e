// Processing jobs and the sending half of the queue

use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingJob {
    pub document_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
#[error("processing queue is closed; job for document {0} was dropped")]
pub struct QueueClosed(pub Uuid);

/// Cloneable handle used to enqueue processing jobs.
#[derive(Debug, Clone)]
pub struct ProcessingQueue {
    sender: mpsc::UnboundedSender<ProcessingJob>,
}

pub type JobReceiver = mpsc::UnboundedReceiver<ProcessingJob>;

impl ProcessingQueue {
    pub fn new() -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, document_id: Uuid) -> Result<(), QueueClosed> {
        self.sender
            .send(ProcessingJob { document_id })
            .map_err(|_| QueueClosed(document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_and_receive() {
        let (queue, mut receiver) = ProcessingQueue::new();
        let id = Uuid::new_v4();
        queue.enqueue(id).unwrap();

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.document_id, id);
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (queue, receiver) = ProcessingQueue::new();
        drop(receiver);

        let id = Uuid::new_v4();
        let err = queue.enqueue(id).unwrap_err();
        assert_eq!(err.0, id);
    }
}
