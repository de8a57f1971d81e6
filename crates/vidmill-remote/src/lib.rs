//! HTTP clients for the pipeline's external collaborators.
//!
//! Each collaborator is specified only at its interface:
//! - Download-URL resolution service (`POST url,token` → download URL)
//! - Text-to-speech service (`GET text,voice,token` → audio URL)
//! - AI-animation capability (condition video, audio, seed → rendered video)
//! - Object-storage upload (`POST file,metadata` → public URL + expiry)
//! - Tabular database record update (`PATCH record_id,field,value`)
//! - Streaming file fetch to uniquely-named local artifacts

pub mod animate;
pub mod error;
pub mod fetch;
pub mod records;
pub mod resolver;
pub mod storage;
pub mod tts;

pub use animate::{AnimationEngine, PassthroughEngine};
pub use error::{RemoteError, RemoteResult};
pub use fetch::fetch_to_file;
pub use records::{RecordClient, RecordClientConfig};
pub use resolver::{ResolverClient, ResolverConfig};
pub use storage::{StorageClient, StorageConfig, UploadedObject};
pub use tts::{TtsClient, TtsConfig};
