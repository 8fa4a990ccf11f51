//! Read-aloud: synthesize the practice sentence so the learner can hear it.
//!
//! [`SpeechSynthesizer`] is the model seam; [`ReadAloud`] is the service the
//! host calls.

pub mod engine;
pub mod read_aloud;

pub use engine::{
    SpeechSynthesizer, SynthesisError, SynthesisRequest, SynthesizedAudio, VoiceModel,
};
pub use read_aloud::{ReadAloud, SpeechClip};

#[cfg(test)]
pub use engine::MockSynthesizer;
