//! One-shot flash messages kept in the session.

use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flashes: Vec<FlashMessage> = session
        .get(session_keys::FLASHES)
        .await?
        .unwrap_or_default();
    flashes.push(FlashMessage::new(level, text));
    session.insert(session_keys::FLASHES, flashes).await
}

/// Remove and return all queued messages.
///
/// A broken session yields no messages rather than failing the page.
pub async fn take_flashes(session: &Session) -> Vec<FlashMessage> {
    session
        .remove::<Vec<FlashMessage>>(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_are_consumed_once() {
        let session = session();
        push_flash(&session, FlashLevel::Success, "Product added.").await.unwrap();
        push_flash(&session, FlashLevel::Warning, "Your cart is empty.").await.unwrap();

        let flashes = take_flashes(&session).await;
        assert_eq!(
            flashes,
            vec![
                FlashMessage::new(FlashLevel::Success, "Product added."),
                FlashMessage::new(FlashLevel::Warning, "Your cart is empty."),
            ]
        );
        assert!(take_flashes(&session).await.is_empty());
    }
}
