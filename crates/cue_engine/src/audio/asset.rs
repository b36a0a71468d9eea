//! Audio clip assets and path resolution
//!
//! Provides [`AudioClip`] for holding encoded clip bytes and the
//! [`AssetResolver`] seam the controller uses to turn a request path into a clip.

use crate::audio::AudioError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions tried, in order, when a request path has none
const CLIP_EXTENSIONS: [&str; 4] = ["wav", "ogg", "mp3", "flac"];

/// Encoded audio clip
///
/// Stores the raw file bytes; decoding is left to the backend voice that
/// plays it. Supports WAV, OGG, MP3, and FLAC.
#[derive(Clone)]
pub struct AudioClip {
    name: String,
    data: Vec<u8>,
    format: AudioFormat,
    duration: Option<f32>,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV uncompressed
    Wav,
    /// OGG Vorbis compressed
    Ogg,
    /// MP3 compressed
    Mp3,
    /// FLAC lossless
    Flac,
    /// Unknown format
    Unknown,
}

impl AudioClip {
    /// Create a clip from raw file bytes
    ///
    /// # Errors
    /// `InvalidAsset` if the data is empty or the format is not recognised.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AudioError> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(AudioError::InvalidAsset(format!("{name}: empty audio file")));
        }

        let format = Self::detect_format(&bytes);
        if format == AudioFormat::Unknown {
            return Err(AudioError::InvalidAsset(format!("{name}: unknown audio format")));
        }

        let duration = match format {
            AudioFormat::Wav => wav_duration(&bytes),
            _ => None,
        };

        Ok(Self { name, data: bytes, format, duration })
    }

    /// Clip name (the path it was resolved from)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Detected container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Length in seconds, when it can be read without decoding (WAV only)
    pub fn duration(&self) -> Option<f32> {
        self.duration
    }

    /// Detect audio format from magic bytes
    fn detect_format(bytes: &[u8]) -> AudioFormat {
        if bytes.len() < 4 {
            return AudioFormat::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => AudioFormat::Wav,
            b"OggS" => AudioFormat::Ogg,
            b"fLaC" => AudioFormat::Flac,
            // MP3 can start with ID3 tag or frame sync
            [0xFF, 0xFB | 0xFA | 0xF3 | 0xF2, _, _] | [b'I', b'D', b'3', _] => AudioFormat::Mp3,
            _ => AudioFormat::Unknown,
        }
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .field("duration", &self.duration)
            .finish()
    }
}

/// Read the play length from a RIFF/WAVE header: data chunk size over byte rate
fn wav_duration(bytes: &[u8]) -> Option<f32> {
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let read_u32 = |at: usize| -> Option<u32> {
        bytes.get(at..at + 4).and_then(|b| b.try_into().ok()).map(u32::from_le_bytes)
    };

    let mut pos = 12;
    let mut byte_rate = None;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = read_u32(pos + 4)? as usize;
        let body = pos + 8;
        match id {
            b"fmt " => byte_rate = read_u32(body + 8),
            b"data" => {
                let rate = byte_rate.filter(|rate| *rate > 0)?;
                return Some(size as f32 / rate as f32);
            }
            _ => {}
        }
        // chunks are word aligned
        pos = body + size + (size & 1);
    }
    None
}

/// Turns a request path into a clip
///
/// A missing clip is an error the controller logs; it never panics.
pub trait AssetResolver {
    /// Resolve `path` to a shared clip
    fn resolve(&mut self, path: &str) -> Result<Arc<AudioClip>, AudioError>;
}

/// Resolves clips from files under a root directory
///
/// Paths are given without extension, e.g. `Audios/BGM/theme`; each of
/// `wav`, `ogg`, `mp3` and `flac` is tried in turn. Resolved clips are cached.
pub struct FileAssetResolver {
    root: PathBuf,
    cache: HashMap<String, Arc<AudioClip>>,
}

impl FileAssetResolver {
    /// Create a resolver rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Number of clips held in the cache
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn find_file(&self, path: &str) -> Option<PathBuf> {
        let base = self.root.join(path);
        if base.extension().is_some() && base.is_file() {
            return Some(base);
        }
        CLIP_EXTENSIONS
            .iter()
            .map(|ext| {
                let mut file = base.clone().into_os_string();
                file.push(".");
                file.push(ext);
                PathBuf::from(file)
            })
            .find(|candidate| candidate.is_file())
    }
}

impl AssetResolver for FileAssetResolver {
    fn resolve(&mut self, path: &str) -> Result<Arc<AudioClip>, AudioError> {
        if let Some(clip) = self.cache.get(path) {
            return Ok(Arc::clone(clip));
        }

        let file = self
            .find_file(path)
            .ok_or_else(|| AudioError::AssetNotFound(path.to_string()))?;
        let bytes = std::fs::read(&file)?;
        let clip = Arc::new(AudioClip::from_bytes(path, bytes)?);

        log::debug!("Loaded clip '{}' from {}", path, file.display());
        self.cache.insert(path.to_string(), Arc::clone(&clip));
        Ok(clip)
    }
}

/// In-memory clip table, for headless runs and embedding
#[derive(Debug, Default)]
pub struct MemoryAssetResolver {
    clips: HashMap<String, Arc<AudioClip>>,
}

impl MemoryAssetResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under `path`
    pub fn insert(&mut self, path: impl Into<String>, clip: AudioClip) {
        self.clips.insert(path.into(), Arc::new(clip));
    }

    /// Builder form of [`MemoryAssetResolver::insert`]
    pub fn with_clip(mut self, path: impl Into<String>, clip: AudioClip) -> Self {
        self.insert(path, clip);
        self
    }
}

impl AssetResolver for MemoryAssetResolver {
    fn resolve(&mut self, path: &str) -> Result<Arc<AudioClip>, AudioError> {
        self.clips
            .get(path)
            .cloned()
            .ok_or_else(|| AudioError::AssetNotFound(path.to_string()))
    }
}

/// Silent 8 kHz mono 16-bit WAV of the given length
#[cfg(test)]
pub(crate) fn silent_wav(seconds: f32) -> Vec<u8> {
    const BYTE_RATE: u32 = 16_000;
    let data_len = ((seconds * BYTE_RATE as f32) as u32) & !1;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&8_000u32.to_le_bytes());
    bytes.extend_from_slice(&BYTE_RATE.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    bytes
}
