use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shadowcast::config::{GcpConfig, SpeechConfig, load_dotenv, resolve_bucket};
use shadowcast::consts::{CLIP_RATE, DEFAULT_SCHOOL_ID, NARRATION_RATE, user_agent};
use shadowcast::jobs::batch::{DEFAULT_BASENAME, batch_narrate};
use shadowcast::jobs::copy_master::{CopyMasterOptions, copy_master_materials};
use shadowcast::jobs::copy_materials::copy_materials_to_classes;
use shadowcast::jobs::dialogue::{dialogue_file, parse_voice_map};
use shadowcast::jobs::dictation_clips::generate_dictation_clips;
use shadowcast::jobs::evaluation::{ScriptPair, generate_evaluation_audio};
use shadowcast::jobs::speak::speak_file;
use shadowcast::jobs::sync_storage::sync_storage_to_firestore;
use shadowcast::objects::gcs::Gcs;
use shadowcast::ssml::{Rate, Voice};
use shadowcast::store::firestore::Firestore;
use shadowcast::tts::azure::AzureSpeech;

#[derive(Parser)]
#[command(name = "shadowcast", version, about = "Lesson audio and material sync jobs.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

/// Speech endpoint credentials.
#[derive(Args)]
struct SpeechArgs {
    /// Azure speech subscription key
    #[arg(long, env = "SPEECH_KEY", hide_env_values = true)]
    speech_key: Option<String>,

    /// Azure speech region
    #[arg(long, env = "SPEECH_REGION")]
    speech_region: Option<String>,
}

/// Firestore / Cloud Storage access.
#[derive(Args)]
struct GcpArgs {
    /// Google Cloud project ID
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    project: Option<String>,

    /// OAuth access token (e.g. from `gcloud auth print-access-token`)
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Firestore emulator host:port
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    emulator_host: Option<String>,

    /// School whose materials are read and written
    #[arg(long, env = "SHADOWCAST_SCHOOL", default_value = DEFAULT_SCHOOL_ID)]
    school: String,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the school's materials into every class
    CopyMaterials {
        #[command(flatten)]
        gcp: GcpArgs,
    },
    /// Seed the school's materials from the master collection
    CopyMaster {
        #[command(flatten)]
        gcp: GcpArgs,

        /// Only copy materials whose ID starts with this
        #[arg(long)]
        prefix: Option<String>,

        /// List what would be copied without writing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Register every audio file in storage as a school material
    SyncStorage {
        #[command(flatten)]
        gcp: GcpArgs,

        /// Storage bucket (default: <project>.firebasestorage.app)
        #[arg(long, env = "SHADOWCAST_BUCKET")]
        bucket: Option<String>,
    },
    /// Generate one clip per question of a dictation file
    Dictation {
        #[command(flatten)]
        speech: SpeechArgs,

        /// Path to dictation.json
        input: PathBuf,

        /// Output directory (default: dictation_audio beside the input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Generate listening-test audio from evaluation scripts
    Evaluation {
        #[command(flatten)]
        speech: SpeechArgs,

        /// Directory holding the scripts
        dir: PathBuf,

        /// SCRIPT:AUDIO pairs, relative to the directory
        #[arg(required = true)]
        pairs: Vec<ScriptPair>,

        /// Prosody rate
        #[arg(long, default_value_t = CLIP_RATE.to_string())]
        rate: String,
    },
    /// Narrate one text file
    Speak {
        #[command(flatten)]
        speech: SpeechArgs,

        input: PathBuf,

        /// Output file; .mp3 or .wav
        #[arg(default_value = "output.mp3")]
        output: PathBuf,

        /// Voice name
        #[arg(long, default_value = shadowcast::consts::DEFAULT_VOICE)]
        voice: String,

        /// Rate: multiplier (0.9), percentage (-10%) or name (slow)
        #[arg(long, default_value = NARRATION_RATE)]
        rate: String,
    },
    /// Render a `Speaker: line` dialogue with a voice per speaker
    Dialogue {
        #[command(flatten)]
        speech: SpeechArgs,

        input: PathBuf,

        #[arg(default_value = "output.wav")]
        output: PathBuf,

        /// SPEAKER=VOICE assignment; `*` sets the fallback voice
        #[arg(long = "voice")]
        voices: Vec<String>,
    },
    /// Narrate every matching script under a directory
    Batch {
        #[command(flatten)]
        speech: SpeechArgs,

        root: PathBuf,

        /// Script file name to look for
        #[arg(long, default_value = DEFAULT_BASENAME)]
        basename: String,

        #[arg(long, default_value = shadowcast::consts::DEFAULT_VOICE)]
        voice: String,

        #[arg(long, default_value = NARRATION_RATE)]
        rate: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv().context("failed to load .env")?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::CopyMaterials { gcp } => {
            let config = gcp_config(&gcp)?;
            let store = Firestore::new(&config);
            let report = copy_materials_to_classes(&store, &gcp.school).await?;
            info!(
                classes = report.classes,
                materials = report.materials,
                copied = report.copied,
                "all class materials copied"
            );
        }
        Command::CopyMaster {
            gcp,
            prefix,
            dry_run,
        } => {
            let config = gcp_config(&gcp)?;
            let store = Firestore::new(&config);
            let options = CopyMasterOptions { prefix, dry_run };
            let report = copy_master_materials(&store, &gcp.school, &options).await?;
            info!(
                found = report.found,
                copied = report.copied.len(),
                dry_run,
                "done"
            );
        }
        Command::SyncStorage { gcp, bucket } => {
            let config = gcp_config(&gcp)?;
            let bucket = resolve_bucket(bucket, &config);
            let objects = Gcs::new(bucket, config.access_token.clone());
            let store = Firestore::new(&config);
            let report = sync_storage_to_firestore(&objects, &store, &gcp.school).await?;
            info!(
                bucket = objects.bucket(),
                scanned = report.scanned,
                synced = report.synced,
                skipped = report.skipped,
                "materials synced"
            );
        }
        Command::Dictation {
            speech,
            input,
            out_dir,
        } => {
            let tts = AzureSpeech::new(&speech_config(speech)?, user_agent("dictation"));
            let out_dir = out_dir.unwrap_or_else(|| {
                input
                    .parent()
                    .map(|p| p.join("dictation_audio"))
                    .unwrap_or_else(|| PathBuf::from("dictation_audio"))
            });
            let written = generate_dictation_clips(&tts, &input, &out_dir).await?;
            info!(clips = written.len(), "all dictation clips generated");
        }
        Command::Evaluation {
            speech,
            dir,
            pairs,
            rate,
        } => {
            let tts = AzureSpeech::new(&speech_config(speech)?, user_agent("evaluation"));
            let report = generate_evaluation_audio(&tts, &dir, &pairs, &Rate::parse(&rate)).await?;
            info!(
                written = report.written.len(),
                skipped = report.skipped.len(),
                "evaluation audio generated"
            );
        }
        Command::Speak {
            speech,
            input,
            output,
            voice,
            rate,
        } => {
            let tts = AzureSpeech::new(&speech_config(speech)?, user_agent("speak"));
            speak_file(&tts, &input, &output, &Voice::new(voice), &Rate::parse(&rate)).await?;
        }
        Command::Dialogue {
            speech,
            input,
            output,
            voices,
        } => {
            let voices = parse_voice_map(&voices)?;
            let tts = AzureSpeech::new(&speech_config(speech)?, user_agent("dialogue"));
            dialogue_file(&tts, &input, &output, &voices).await?;
        }
        Command::Batch {
            speech,
            root,
            basename,
            voice,
            rate,
        } => {
            let tts = AzureSpeech::new(&speech_config(speech)?, user_agent("batch"));
            let report =
                batch_narrate(&tts, &root, &basename, &Voice::new(voice), &Rate::parse(&rate)).await?;
            info!(
                found = report.found,
                written = report.written.len(),
                skipped = report.skipped.len(),
                "batch finished"
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "shadowcast=debug" } else { "shadowcast=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn speech_config(args: SpeechArgs) -> anyhow::Result<SpeechConfig> {
    Ok(SpeechConfig::resolve(args.speech_key, args.speech_region)?)
}

fn gcp_config(args: &GcpArgs) -> anyhow::Result<GcpConfig> {
    Ok(GcpConfig::resolve(
        args.project.clone(),
        args.access_token.clone(),
        args.emulator_host.clone(),
    )?)
}
