//! Project-wide constants.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// School whose materials are synced when none is given.
pub const DEFAULT_SCHOOL_ID: &str = "Obu-high";

/// Default Azure speech region.
pub const DEFAULT_SPEECH_REGION: &str = "japaneast";

/// Narrator used for every single-voice clip.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Language tag for the `speak` and `voice` elements.
pub const DEFAULT_LANG: &str = "en-US";

/// Prosody rate for dictation and evaluation clips.
pub const CLIP_RATE: f32 = 0.8;

/// Prosody rate for `speak` and `batch` when none is given.
pub const NARRATION_RATE: &str = "0.9";

/// Object key prefix holding the lesson audio tree.
pub const AUDIO_PREFIX: &str = "assets/audio/";

/// Firestore rejects commits above 500 writes; stay well under.
pub const MAX_BATCH_WRITES: usize = 450;

/// Build the `User-Agent` header sent to the speech endpoint for a job.
pub fn user_agent(job: &str) -> String {
    format!("shadowcast-{job}/{VERSION}")
}
