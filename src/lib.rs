pub mod blanks;
pub mod config;
pub mod consts;
pub mod dictation;
pub mod jobs;
pub mod objects;
pub mod ssml;
pub mod store;
pub mod tts;
