use std::sync::Arc;

use tokio::sync::watch;

use super::{reduce, Action, State};
use crate::error::CoreResult;

/// Holds the current snapshot and publishes each new one whole. A rejected
/// action publishes nothing.
pub struct Store {
    current: Arc<State>,
    tx: watch::Sender<Arc<State>>,
}

impl Store {
    pub fn new(initial: State) -> Self {
        let current = Arc::new(initial);
        let (tx, _) = watch::channel(current.clone());

        Self { current, tx }
    }

    pub fn snapshot(&self) -> Arc<State> { self.current.clone() }

    pub fn subscribe(&self) -> watch::Receiver<Arc<State>> { self.tx.subscribe() }

    pub fn dispatch(&mut self, action: Action) -> CoreResult<()> {
        tracing::trace!("dispatch - {:?}", action);

        let next = Arc::new(reduce(&self.current, action)?);
        self.current = next.clone();
        self.tx.send_replace(next);

        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self { Self::new(State::default()) }
}

#[tokio::test]
async fn subscribers_see_whole_snapshots() {
    use super::Mode;

    let mut store = Store::default();
    let mut rx = store.subscribe();

    store.dispatch(Action::ToggleMode).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().mode, Mode::Dark);

    let before = store.snapshot();
    assert!(store
        .dispatch(Action::SetFriends {
            user_id: crate::entities::UserId::generate(),
            friends: vec![],
        })
        .is_err());
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert!(!rx.has_changed().unwrap());
}
