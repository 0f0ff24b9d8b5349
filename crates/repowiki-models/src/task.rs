use std::future::Future;

tokio::task_local! {
    static TASK_ID: u64;
}

/// Run a future with a task identifier carried on the call context.
///
/// Usage records forwarded by the routing proxy are attributed to this id.
pub async fn with_task_id<F: Future>(task_id: u64, f: F) -> F::Output {
    TASK_ID.scope(task_id, f).await
}

/// Task identifier of the current call context, if any
pub fn current_task_id() -> Option<u64> {
    TASK_ID.try_with(|id| *id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_id_scoping() {
        assert_eq!(current_task_id(), None);
        let seen = with_task_id(42, async { current_task_id() }).await;
        assert_eq!(seen, Some(42));
        assert_eq!(current_task_id(), None);
    }
}
