//! The embedding-facing chat surface.
//!
//! [`ChatClient`] ties the session, store, and blob storage together:
//! deterministic room entry, text and file sending, and the live
//! subscriptions a conversation screen consumes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tandem_session::Session;
use tandem_shared::constants::FALLBACK_MIME;
use tandem_shared::error::Result;
use tandem_shared::{RoomId, TandemError, UserId};
use tandem_store::{BlobStore, Message, MessageBody, PresenceRecord, Store, Subscription};

/// One chat surface bound to the signed-in user.
pub struct ChatClient {
    session: Arc<Session>,
    store: Store,
    blobs: Arc<dyn BlobStore>,
    staging_dir: PathBuf,
}

impl ChatClient {
    pub fn new(
        session: Arc<Session>,
        store: Store,
        blobs: Arc<dyn BlobStore>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            session,
            store,
            blobs,
            staging_dir,
        }
    }

    /// Enter the conversation with `peer`.
    ///
    /// The room id is derived from the two participant ids, so both
    /// sides resolve the same room without coordination.  The room
    /// record is merge-upserted on every entry; re-entering never
    /// resets it.
    pub fn open_room(&self, peer: &UserId) -> Result<RoomId> {
        let me = self.session.current_user_id()?;
        let room_id = RoomId::for_pair(&me, peer);
        self.store.ensure_room(&room_id)?;
        Ok(room_id)
    }

    /// Send the draft as a text message.
    ///
    /// The draft is trimmed first; an all-whitespace draft is rejected
    /// before anything is written.  On acceptance the draft buffer is
    /// cleared immediately, so the compose box resets even if the write
    /// then fails.
    pub async fn send_text(&self, room_id: &RoomId, draft: &mut String) -> Result<Message> {
        let text = draft.trim().to_string();
        if text.is_empty() {
            return Err(TandemError::Validation("Message is empty".to_string()));
        }
        draft.clear();

        let sender = self.session.current_profile()?;
        let message = self
            .store
            .append_message(room_id, &sender, MessageBody::Text { text })?;
        Ok(message)
    }

    /// Send a local file as an attachment.
    ///
    /// Three phases: stage a copy under the local cache, upload the
    /// staged bytes to blob storage, and only then append the file
    /// message carrying the returned URL.  A failure in any phase
    /// surfaces one error and writes no message, so the log never
    /// references an attachment that was not fully uploaded.
    pub async fn send_file(&self, room_id: &RoomId, source: &Path) -> Result<Message> {
        let sender = self.session.current_profile()?;

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TandemError::Validation("File has no name".to_string()))?;
        let file_type = mime_for_path(source).to_string();

        // Phase 1: stage.
        let staging = self.staging_dir.join(room_id.as_str());
        tokio::fs::create_dir_all(&staging).await?;
        let staged = staging.join(&file_name);
        tokio::fs::copy(source, &staged).await?;

        // Phase 2: upload.
        let data = Bytes::from(tokio::fs::read(&staged).await?);
        let file_size = data.len() as i64;
        let file_url = match self.blobs.put(room_id, &file_name, data).await {
            Ok(url) => url,
            Err(e) => {
                warn!(room = %room_id, file = %file_name, error = %e, "attachment upload failed");
                return Err(e.into());
            }
        };

        // Phase 3: append, only after the upload confirmed.
        let message = self.store.append_message(
            room_id,
            &sender,
            MessageBody::File {
                file_name: file_name.clone(),
                file_type,
                file_size,
                file_url,
            },
        )?;
        info!(room = %room_id, file = %file_name, size = file_size, "attachment sent");
        Ok(message)
    }

    /// Live ordered message log of a room, for the conversation screen.
    pub fn subscribe_room(
        &self,
        room_id: RoomId,
        sink: mpsc::UnboundedSender<Vec<Message>>,
    ) -> Subscription {
        self.store.subscribe_messages(room_id, sink)
    }

    /// Live newest-message feed of a room, for the room list preview.
    pub fn subscribe_preview(
        &self,
        room_id: RoomId,
        sink: mpsc::UnboundedSender<Option<Message>>,
    ) -> Subscription {
        self.store.subscribe_latest(room_id, sink)
    }

    /// Live presence record of a peer, for the conversation header.
    pub fn subscribe_presence(
        &self,
        user_id: UserId,
        sink: mpsc::UnboundedSender<PresenceRecord>,
    ) -> Subscription {
        self.store.subscribe_presence(user_id, sink)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// MIME type from the file extension, as reported by the picker in the
/// embedding UI.  Unknown extensions fall back to the generic type and
/// render as plain files.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("pdf") => "application/pdf",
        _ => FALLBACK_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tandem_session::LocalAuthProvider;
    use tandem_shared::MediaCategory;
    use tandem_store::{Database, FsBlobStore, StoreError};

    async fn signed_in_client() -> (ChatClient, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let store = Store::new(db);
        let session = Arc::new(Session::new(Arc::new(LocalAuthProvider::new()), store.clone()));
        session
            .register("alice@example.com", "hunter22", "Alice", "https://a.png")
            .await
            .unwrap();

        let blobs = Arc::new(
            FsBlobStore::open(dir.path().join("blobs"))
                .await
                .unwrap(),
        );
        let client = ChatClient::new(session, store, blobs, dir.path().join("staging"));
        (client, dir)
    }

    /// Blob store that always fails uploads, for atomicity checks.
    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn put(
            &self,
            _: &RoomId,
            _: &str,
            _: Bytes,
        ) -> std::result::Result<String, StoreError> {
            Err(StoreError::Blob("upload refused".to_string()))
        }

        async fn download_url(
            &self,
            _: &RoomId,
            _: &str,
        ) -> std::result::Result<String, StoreError> {
            Err(StoreError::Blob("upload refused".to_string()))
        }

        async fn get(&self, _: &RoomId, _: &str) -> std::result::Result<Bytes, StoreError> {
            Err(StoreError::Blob("upload refused".to_string()))
        }
    }

    #[tokio::test]
    async fn open_room_is_deterministic_and_idempotent() {
        let (client, _dir) = signed_in_client().await;
        let peer = UserId::from("uid-bob");

        let first = client.open_room(&peer).unwrap();
        let created = client.store().get_room(&first).unwrap();

        let second = client.open_room(&peer).unwrap();
        assert_eq!(first, second);
        // Re-entry preserves the original record.
        let reopened = client.store().get_room(&second).unwrap();
        assert_eq!(created.created_at, reopened.created_at);
    }

    #[tokio::test]
    async fn whitespace_draft_is_rejected_without_a_write() {
        let (client, _dir) = signed_in_client().await;
        let room = client.open_room(&UserId::from("uid-bob")).unwrap();

        let mut draft = "   \n\t  ".to_string();
        let err = client.send_text(&room, &mut draft).await.unwrap_err();
        assert!(matches!(err, TandemError::Validation(_)));
        assert!(client.store().messages_for_room(&room).unwrap().is_empty());
        // A rejected draft is left alone.
        assert_eq!(draft, "   \n\t  ");
    }

    #[tokio::test]
    async fn send_text_trims_stamps_sender_and_clears_the_draft() {
        let (client, _dir) = signed_in_client().await;
        let room = client.open_room(&UserId::from("uid-bob")).unwrap();

        let mut draft = "  hello there  ".to_string();
        let message = client.send_text(&room, &mut draft).await.unwrap();

        assert!(draft.is_empty());
        assert_eq!(message.sender_name, "Alice");
        assert_eq!(message.profile_url, "https://a.png");
        assert_eq!(
            message.body,
            MessageBody::Text {
                text: "hello there".to_string()
            }
        );

        let log = client.store().messages_for_room(&room).unwrap();
        assert_eq!(log, vec![message]);
    }

    #[tokio::test]
    async fn send_file_uploads_then_appends() {
        let (client, dir) = signed_in_client().await;
        let room = client.open_room(&UserId::from("uid-bob")).unwrap();

        let source = dir.path().join("holiday.png");
        std::fs::write(&source, b"not really a png").unwrap();

        let message = client.send_file(&room, &source).await.unwrap();
        match &message.body {
            MessageBody::File {
                file_name,
                file_type,
                file_size,
                file_url,
            } => {
                assert_eq!(file_name, "holiday.png");
                assert_eq!(file_type, "image/png");
                assert_eq!(*file_size, 16);
                assert!(file_url.starts_with("file://"));
            }
            other => panic!("expected a file message, got {other:?}"),
        }
        assert_eq!(message.body.category(), Some(MediaCategory::Image));
    }

    #[tokio::test]
    async fn failed_upload_writes_no_message() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let store = Store::new(db);
        let session = Arc::new(Session::new(Arc::new(LocalAuthProvider::new()), store.clone()));
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();
        let client = ChatClient::new(
            session,
            store,
            Arc::new(FailingBlobStore),
            dir.path().join("staging"),
        );

        let room = client.open_room(&UserId::from("uid-bob")).unwrap();
        let source = dir.path().join("report.pdf");
        std::fs::write(&source, b"pdf bytes").unwrap();

        let err = client.send_file(&room, &source).await;
        assert!(err.is_err());
        assert!(client.store().messages_for_room(&room).unwrap().is_empty());
    }

    #[tokio::test]
    async fn sending_requires_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let store = Store::new(db);
        let session = Arc::new(Session::new(Arc::new(LocalAuthProvider::new()), store.clone()));
        let client = ChatClient::new(
            session,
            store,
            Arc::new(FailingBlobStore),
            dir.path().join("staging"),
        );

        let err = client.open_room(&UserId::from("uid-bob")).unwrap_err();
        assert!(matches!(err, TandemError::NotSignedIn));
    }

    #[test]
    fn mime_guesses_cover_the_picker_types() {
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.mp4")), "video/mp4");
        assert_eq!(mime_for_path(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("a.pdf")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("archive.tar.zst")), FALLBACK_MIME);
        assert_eq!(mime_for_path(Path::new("noext")), FALLBACK_MIME);
    }
}
