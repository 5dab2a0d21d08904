use std::fs;

use shadowcast::consts::NARRATION_RATE;
use shadowcast::jobs::batch::{DEFAULT_BASENAME, batch_narrate};
use shadowcast::jobs::dialogue::{dialogue_file, parse_voice_map};
use shadowcast::jobs::evaluation::{ScriptPair, generate_evaluation_audio};
use shadowcast::jobs::speak::speak_file;
use shadowcast::ssml::{Rate, Voice};
use shadowcast::tts::AudioFormat;
use shadowcast::tts::mock::MockSynthesizer;

// ── Evaluation scripts ───────────────────────────────────────────

#[tokio::test]
async fn evaluation_reads_label_then_body() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("script2.txt"),
        "Question 1.\nMike is at the station.\nWhere is he going?\n",
    )
    .unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());
    let pairs = vec!["script2.txt:listening_test2.wav".parse::<ScriptPair>().unwrap()];

    let report = generate_evaluation_audio(&tts, dir.path(), &pairs, &Rate::Multiplier(0.8))
        .await
        .unwrap();

    assert_eq!(report.written, vec![dir.path().join("listening_test2.wav")]);
    assert!(report.skipped.is_empty());
    assert_eq!(fs::read(dir.path().join("listening_test2.wav")).unwrap(), b"RIFF");

    let requests = tts.requests();
    assert_eq!(requests[0].1, AudioFormat::Wav);
    assert!(requests[0].0.contains(
        "Question 1.<break time=\"2s\"/>Mike is at the station.\nWhere is he going?"
    ));
}

#[tokio::test]
async fn evaluation_skips_missing_scripts() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("script1.txt"), "One line only").unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());
    let pairs = vec![
        ScriptPair {
            script: "missing.txt".to_string(),
            audio: "missing.wav".to_string(),
        },
        ScriptPair {
            script: "script1.txt".to_string(),
            audio: "test1.wav".to_string(),
        },
    ];

    let report = generate_evaluation_audio(&tts, dir.path(), &pairs, &Rate::Multiplier(0.8))
        .await
        .unwrap();

    assert_eq!(report.skipped, vec![dir.path().join("missing.txt")]);
    assert_eq!(report.written.len(), 1);
    assert_eq!(tts.requests().len(), 1);
    assert!(!tts.requests()[0].0.contains("<break"));
}

// ── Single narration ─────────────────────────────────────────────

#[tokio::test]
async fn speak_uses_voice_rate_and_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    fs::write(&input, "  Fish & chips <today>.  \n").unwrap();
    let output = dir.path().join("out").join("speech.mp3");
    let tts = MockSynthesizer::new(b"ID3".to_vec());

    speak_file(
        &tts,
        &input,
        &output,
        &Voice::new("en-US-GuyNeural"),
        &Rate::parse("0.9"),
    )
    .await
    .unwrap();

    assert_eq!(fs::read(&output).unwrap(), b"ID3");
    let (ssml, format) = &tts.requests()[0];
    assert_eq!(*format, AudioFormat::Mp3);
    assert!(ssml.contains(r#"name="en-US-GuyNeural""#));
    assert!(ssml.contains(r#"<prosody rate="-10%">Fish &amp; chips &lt;today&gt;.</prosody>"#));
}

#[tokio::test]
async fn speak_default_rate_is_sent_as_percent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    fs::write(&input, "Hello.").unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());

    speak_file(
        &tts,
        &input,
        &dir.path().join("out.wav"),
        &Voice::default(),
        &Rate::parse(NARRATION_RATE),
    )
    .await
    .unwrap();

    let (ssml, _) = &tts.requests()[0];
    assert!(ssml.contains(r#"<prosody rate="-10%">Hello.</prosody>"#));
    assert!(!ssml.contains(r#"rate="0.9""#));
}

#[tokio::test]
async fn speak_keeps_percent_and_named_rates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    fs::write(&input, "Hi.").unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());

    for rate in ["+5%", "slow"] {
        speak_file(&tts, &input, &dir.path().join("o.wav"), &Voice::default(), &Rate::parse(rate))
            .await
            .unwrap();
    }

    let requests = tts.requests();
    assert!(requests[0].0.contains(r#"<prosody rate="+5%">"#));
    assert!(requests[1].0.contains(r#"<prosody rate="slow">"#));
}

#[tokio::test]
async fn speak_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "   \n").unwrap();
    let tts = MockSynthesizer::new(Vec::new());

    let result = speak_file(&tts, &input, &dir.path().join("o.wav"), &Voice::default(), &Rate::parse("1")).await;

    assert!(result.is_err());
    assert!(tts.requests().is_empty());
}

// ── Dialogue ─────────────────────────────────────────────────────

#[tokio::test]
async fn dialogue_uses_level_rate_and_speaker_voices() {
    let dir = tempfile::tempdir().unwrap();
    let lesson = dir.path().join("official").join("Level2").join("Unit1");
    fs::create_dir_all(&lesson).unwrap();
    let input = lesson.join("dialogue.txt");
    fs::write(&input, "Mom: Hi, Daniel.\n\nDaniel: He went to the store.\n").unwrap();
    let output = dir.path().join("dialogue.wav");
    let voices = parse_voice_map(&[
        "Mom=en-US-JennyNeural".to_string(),
        "Daniel=en-US-ChristopherNeural".to_string(),
    ])
    .unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());

    dialogue_file(&tts, &input, &output, &voices).await.unwrap();

    let sidecar = fs::read_to_string(dir.path().join("dialogue.ssml")).unwrap();
    let (ssml, format) = &tts.requests()[0];
    assert_eq!(&sidecar, ssml);
    assert_eq!(*format, AudioFormat::Wav);
    assert_eq!(ssml.matches(r#"<prosody rate="-27%">"#).count(), 2);
    assert!(ssml.contains(r#"name="en-US-ChristopherNeural"><prosody rate="-27%">He went to the store."#));
    assert!(output.exists());
}

#[tokio::test]
async fn dialogue_without_level_has_no_prosody() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("talk.txt");
    fs::write(&input, "Someone: Hello.").unwrap();
    let tts = MockSynthesizer::new(b"RIFF".to_vec());

    dialogue_file(&tts, &input, &dir.path().join("talk.wav"), &parse_voice_map(&[]).unwrap())
        .await
        .unwrap();

    let (ssml, _) = &tts.requests()[0];
    assert!(!ssml.contains("prosody"));
    assert!(ssml.contains(r#"name="en-US-JennyNeural">Hello.<break time="150ms"/></voice>"#));
}

#[tokio::test]
async fn dialogue_with_no_lines_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blank.txt");
    fs::write(&input, "\n\n").unwrap();
    let tts = MockSynthesizer::new(Vec::new());

    let result = dialogue_file(&tts, &input, &dir.path().join("b.wav"), &parse_voice_map(&[]).unwrap()).await;

    assert!(result.is_err());
    assert!(tts.requests().is_empty());
}

// ── Batch ────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_skips_existing_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let done = dir.path().join("Unit1");
    let todo = dir.path().join("Unit2");
    fs::create_dir_all(&done).unwrap();
    fs::create_dir_all(&todo).unwrap();
    fs::write(done.join("listening.txt"), "Already done.").unwrap();
    fs::write(done.join("listening.mp3"), "old").unwrap();
    fs::write(todo.join("listening.txt"), "Still to do.").unwrap();
    fs::write(todo.join("notes.txt"), "ignored").unwrap();
    let tts = MockSynthesizer::new(b"ID3".to_vec());

    let report = batch_narrate(
        &tts,
        dir.path(),
        DEFAULT_BASENAME,
        &Voice::default(),
        &Rate::parse("0.9"),
    )
    .await
    .unwrap();

    assert_eq!(report.found, 2);
    assert_eq!(report.skipped, vec![done.join("listening.mp3")]);
    assert_eq!(report.written, vec![todo.join("listening.mp3")]);
    assert_eq!(fs::read(done.join("listening.mp3")).unwrap(), b"old");
    assert_eq!(fs::read(todo.join("listening.mp3")).unwrap(), b"ID3");
    assert_eq!(tts.requests().len(), 1);
    assert_eq!(tts.requests()[0].1, AudioFormat::Mp3);
    assert!(tts.requests()[0].0.contains(r#"<prosody rate="-10%">Still to do.</prosody>"#));
}

#[tokio::test]
async fn batch_stops_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    for unit in ["A", "B"] {
        let path = dir.path().join(unit);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("listening.txt"), "text").unwrap();
    }
    let tts = MockSynthesizer::new(b"ID3".to_vec()).failing_from(0);

    let result = batch_narrate(&tts, dir.path(), DEFAULT_BASENAME, &Voice::default(), &Rate::parse("1")).await;

    assert!(result.is_err());
    assert_eq!(tts.requests().len(), 1);
}
