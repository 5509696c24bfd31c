//! Upload session manager.
//!
//! Coordinates the three slots (video, audio, optional thumbnail) into one
//! multipart submission. Files enter a slot only after passing validation;
//! submission requires both required slots and is guarded so at most one
//! attempt is in flight at a time. Fractional progress is published on a
//! watch channel as bytes are handed to the transport.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio::sync::watch;
use tracing::{debug, info};

use crosspost_core::constants::UPLOAD_CHUNK_SIZE;
use crosspost_core::validation::{content_type_for_path, validate_file, FileRejection, MediaKind};
use crosspost_core::{ClientError, UploadResponse};

use crate::ApiClient;

/// A validated file occupying a slot.
#[derive(Debug, Clone)]
pub struct SlotFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Lifecycle of one submission. `Succeeded` and `Failed` return to `Idle`
/// on the next file change or an explicit `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Succeeded { project_id: String },
    Failed { message: String },
}

#[derive(Debug, Default)]
struct Slots {
    video: Option<SlotFile>,
    audio: Option<SlotFile>,
    thumbnail: Option<SlotFile>,
}

impl Slots {
    fn slot_mut(&mut self, kind: MediaKind) -> &mut Option<SlotFile> {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
            MediaKind::Thumbnail => &mut self.thumbnail,
        }
    }
}

/// Coordinates slot state and the submission lifecycle for one upload form.
pub struct UploadSession {
    client: ApiClient,
    slots: Mutex<Slots>,
    phase: Mutex<UploadPhase>,
    in_flight: AtomicBool,
    progress_tx: watch::Sender<u8>,
}

impl UploadSession {
    pub fn new(client: ApiClient) -> Self {
        let (progress_tx, _) = watch::channel(0u8);
        UploadSession {
            client,
            slots: Mutex::new(Slots::default()),
            phase: Mutex::new(UploadPhase::Idle),
            in_flight: AtomicBool::new(false),
            progress_tx,
        }
    }

    /// Validate a file and place it in its slot. Re-selecting a slot
    /// replaces the prior selection; a rejected file leaves the slot as it
    /// was. Any file change returns the phase to `Idle`.
    pub fn set_file(
        &self,
        kind: MediaKind,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Bytes,
    ) -> Result<(), FileRejection> {
        let content_type = content_type.into();
        validate_file(&content_type, bytes.len() as u64, kind)?;
        let mut slots = self.slots.lock().expect("slots lock poisoned");
        *slots.slot_mut(kind) = Some(SlotFile {
            filename: filename.into(),
            content_type,
            bytes,
        });
        self.return_to_idle();
        Ok(())
    }

    /// Read a file from disk into a slot, inferring its content type from
    /// the extension.
    pub fn set_file_from_path(&self, kind: MediaKind, path: &Path) -> Result<(), ClientError> {
        let content_type = content_type_for_path(path).ok_or_else(|| {
            ClientError::Validation(format!(
                "Cannot determine content type for {}",
                path.display()
            ))
        })?;
        let bytes = std::fs::read(path)
            .map_err(|e| ClientError::Validation(format!("Failed to read {}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        self.set_file(kind, filename, content_type, Bytes::from(bytes))
            .map_err(|rejection| ClientError::Validation(rejection.to_string()))
    }

    /// Remove a file from its slot. Empty selection is a no-op elsewhere;
    /// clearing an already-empty slot is fine.
    pub fn clear_slot(&self, kind: MediaKind) {
        let mut slots = self.slots.lock().expect("slots lock poisoned");
        *slots.slot_mut(kind) = None;
        self.return_to_idle();
    }

    /// Drop all slots and return to `Idle`.
    pub fn reset(&self) {
        *self.slots.lock().expect("slots lock poisoned") = Slots::default();
        if !self.in_flight.load(Ordering::Acquire) {
            *self.phase.lock().expect("phase lock poisoned") = UploadPhase::Idle;
            self.progress_tx.send_replace(0);
        }
    }

    /// Phase transitions on slot changes only apply between submissions; a
    /// flight in progress owns the phase until it resolves.
    fn return_to_idle(&self) {
        if !self.in_flight.load(Ordering::Acquire) {
            *self.phase.lock().expect("phase lock poisoned") = UploadPhase::Idle;
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase.lock().expect("phase lock poisoned").clone()
    }

    /// Fractional progress, 0-100. Subscribers see the latest value.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress_tx.subscribe()
    }

    /// Whether both required slots hold a validated file.
    pub fn is_submittable(&self) -> bool {
        let slots = self.slots.lock().expect("slots lock poisoned");
        slots.video.is_some() && slots.audio.is_some()
    }

    /// Submit the form. Preconditions are checked before any network I/O:
    /// both required slots must be filled and no other submission may be in
    /// flight. On success returns the server-assigned project id; on failure
    /// the phase carries the classified user message and progress resets.
    pub async fn submit(&self) -> Result<String, ClientError> {
        let (video, audio, thumbnail) = {
            let slots = self.slots.lock().expect("slots lock poisoned");
            match (&slots.video, &slots.audio) {
                (Some(v), Some(a)) => (v.clone(), a.clone(), slots.thumbnail.clone()),
                _ => {
                    return Err(ClientError::Validation(
                        "Both video and audio files are required.".to_string(),
                    ))
                }
            }
        };

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(ClientError::Validation(
                "An upload is already in progress.".to_string(),
            ));
        }

        *self.phase.lock().expect("phase lock poisoned") = UploadPhase::Uploading;
        self.progress_tx.send_replace(0);

        let result = self.send_form(video, audio, thumbnail).await;
        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(response) => {
                self.progress_tx.send_replace(100);
                info!(project_id = %response.project_id, "upload accepted");
                *self.phase.lock().expect("phase lock poisoned") = UploadPhase::Succeeded {
                    project_id: response.project_id.clone(),
                };
                Ok(response.project_id)
            }
            Err(err) => {
                self.progress_tx.send_replace(0);
                *self.phase.lock().expect("phase lock poisoned") = UploadPhase::Failed {
                    message: err.user_message(),
                };
                Err(err)
            }
        }
    }

    async fn send_form(
        &self,
        video: SlotFile,
        audio: SlotFile,
        thumbnail: Option<SlotFile>,
    ) -> Result<UploadResponse, ClientError> {
        let total: u64 = [Some(&video), Some(&audio), thumbnail.as_ref()]
            .into_iter()
            .flatten()
            .map(|f| f.bytes.len() as u64)
            .sum();
        let sent = Arc::new(AtomicU64::new(0));
        debug!(total_bytes = total, "starting multipart submission");

        let mut form = Form::new()
            .part(
                MediaKind::Video.field_name(),
                self.progress_part(&video, total, &sent)?,
            )
            .part(
                MediaKind::Audio.field_name(),
                self.progress_part(&audio, total, &sent)?,
            );
        if let Some(thumb) = &thumbnail {
            form = form.part(
                MediaKind::Thumbnail.field_name(),
                self.progress_part(thumb, total, &sent)?,
            );
        }

        self.client.post_multipart("/upload", form).await
    }

    /// Build one multipart part whose body reports cumulative progress as
    /// chunks are handed to the transport.
    fn progress_part(
        &self,
        file: &SlotFile,
        total: u64,
        sent: &Arc<AtomicU64>,
    ) -> Result<Part, ClientError> {
        let len = file.bytes.len() as u64;
        let chunks = chunk_bytes(&file.bytes);
        let sent = Arc::clone(sent);
        let progress_tx = self.progress_tx.clone();

        let body = stream::iter(chunks).map(move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::AcqRel) + chunk.len() as u64;
            let percent = if total == 0 {
                100
            } else {
                ((done * 100) / total).min(100) as u8
            };
            progress_tx.send_replace(percent);
            Ok::<Bytes, io::Error>(chunk)
        });

        Part::stream_with_length(reqwest::Body::wrap_stream(body), len)
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ClientError::Validation(format!("Invalid content type: {}", e)))
    }
}

/// Split a buffer into transport-sized chunks. `Bytes::slice` is a refcount
/// bump, not a copy.
fn chunk_bytes(bytes: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + UPLOAD_CHUNK_SIZE).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}
