//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::load_config;
use rand::SeedableRng;
use rand::rngs::StdRng;
use riposte_core::{
    ExtraData, LogicChain, MemoryCorpus, ResponderConfig, RiposteError, Session, Statement,
    StatementRecord, Turn, corpus_from_bytes, corpus_to_bytes, snapshot_checksum,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for training input (100 MB).
const MAX_TRAIN_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum file size for import (500 MB).
///
/// Import files can be larger since they contain whole corpora.
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), RiposteError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RiposteError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(RiposteError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path: canonical, existing, and a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, RiposteError> {
    let canonical = path.canonicalize().map_err(|e| {
        RiposteError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RiposteError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, RiposteError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        RiposteError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(RiposteError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| RiposteError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Storage backend chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Snapshot file loaded into memory, written back after changes.
    File,
    /// redb database, every change committed immediately.
    Redb,
}

impl Backend {
    /// Parse a backend name.
    pub fn parse(name: &str) -> Result<Self, RiposteError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(RiposteError::InvalidConfig(format!(
                "Unknown backend: {}. Use: file, redb",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Redb => write!(f, "redb"),
        }
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<(), RiposteError> {
    let config = load_config(config_path)?;
    let session = load_or_create_session(db_path, backend)?;

    println!("Riposte Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Backend:    {}", backend);
    println!("  Database:   {:?}", db_path);
    println!("  Comparator: {:?}", config.comparator);
    println!("  Tie-break:  {:?}", config.tie_break);
    println!("  Learning:   {}", config.learn);
    println!();
    println!("Endpoints:");
    println!("  POST /respond            - Answer an input");
    println!("  POST /statements         - Record a statement");
    println!("  POST /statements/forget  - Remove a statement");
    println!("  GET  /status             - Corpus status");
    println!("  POST /export             - Export corpus snapshot");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let snapshot = (backend == Backend::File).then(|| db_path.to_path_buf());
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session, &config, snapshot).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show corpus status.
pub fn cmd_status(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), RiposteError> {
    let session = load_or_create_session(db_path, backend)?;
    let metrics = session.metrics()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.to_string(),
            "statement_count": metrics.statement_count,
            "linked_statement_count": metrics.linked_statement_count,
            "response_link_count": metrics.response_link_count,
            "total_occurrences": metrics.total_occurrences,
        }));
        return Ok(());
    }

    println!("Riposte Corpus Status");
    println!("=====================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Statements:          {}", metrics.statement_count);
    println!("Answered statements: {}", metrics.linked_statement_count);
    println!("Response links:      {}", metrics.response_link_count);
    println!("Total occurrences:   {}", metrics.total_occurrences);

    Ok(())
}

// =============================================================================
// RESPOND / CHAT COMMANDS
// =============================================================================

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_turn(turn: &Turn, json_mode: bool) {
    if json_mode {
        print_json(&serde_json::json!({
            "input": turn.input.text,
            "response": turn.response.text,
            "confidence": turn.response.confidence.value(),
            "confident": turn.response.confidence.is_confident(),
            "learned": turn.learned,
        }));
    } else {
        println!("{}", turn.response.text);
    }
}

/// Answer one input.
pub fn cmd_respond(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    json_mode: bool,
    text: &str,
    no_learn: bool,
    seed: Option<u64>,
) -> Result<(), RiposteError> {
    let config = load_config(config_path)?;
    let turn = respond_once(db_path, backend, &config, text, no_learn, seed)?;
    print_turn(&turn, json_mode);
    Ok(())
}

/// Load the corpus, answer `text`, and save if the input was learned.
///
/// With a seed, both the tie-break and the corpus random fallback are
/// reproducible.
pub fn respond_once(
    db_path: &Path,
    backend: Backend,
    config: &ResponderConfig,
    text: &str,
    no_learn: bool,
    seed: Option<u64>,
) -> Result<Turn, RiposteError> {
    let chain = config.build_chain()?;
    let learn = config.learn && !no_learn;

    let mut session = load_session_with_seed(db_path, backend, seed)?;
    let mut rng = make_rng(seed);

    let turn = session.respond(&chain, text, ExtraData::new(), learn, &mut rng)?;
    if turn.learned {
        save_session(&session, db_path)?;
    }
    Ok(turn)
}

/// Answer stdin line by line, remembering the previous response.
pub fn cmd_chat(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    json_mode: bool,
    no_learn: bool,
    seed: Option<u64>,
) -> Result<(), RiposteError> {
    let config = load_config(config_path)?;
    let chain = config.build_chain()?;
    let learn = config.learn && !no_learn;

    let mut session = load_session_with_seed(db_path, backend, seed)?;
    let mut rng = make_rng(seed);

    let stdin = std::io::stdin();
    chat_loop(
        &mut session,
        &chain,
        stdin.lock(),
        learn,
        &mut rng,
        db_path,
        json_mode,
    )
}

/// Answer each line of `input` until EOF, `exit` or `quit`.
///
/// Every learned turn is saved before the next line is read, so an error
/// on a later line keeps what was already learned.
fn chat_loop(
    session: &mut Session,
    chain: &LogicChain,
    input: impl BufRead,
    learn: bool,
    rng: &mut StdRng,
    db_path: &Path,
    json_mode: bool,
) -> Result<(), RiposteError> {
    for line in input.lines() {
        let line = line.map_err(|e| RiposteError::IoError(format!("Read stdin: {}", e)))?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }

        match session.respond(chain, text, ExtraData::new(), learn, rng) {
            Ok(turn) => {
                if turn.learned {
                    save_session(session, db_path)?;
                }
                print_turn(&turn, json_mode);
            }
            Err(RiposteError::EmptyCorpus) => {
                eprintln!("The corpus is empty. Record or train statements first.");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// =============================================================================
// RECORD / TRAIN / FORGET COMMANDS
// =============================================================================

/// Record one statement.
pub fn cmd_record(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    text: &str,
    in_response_to: Option<&str>,
) -> Result<(), RiposteError> {
    let mut session = load_or_create_session(db_path, backend)?;
    session.record(&Statement::new(text), in_response_to)?;
    save_session(&session, db_path)?;

    let count = session.statement_count()?;
    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "text": text,
            "in_response_to": in_response_to,
            "statement_count": count,
        }));
    } else {
        match in_response_to {
            Some(context) => println!("Recorded {:?} in response to {:?}", text, context),
            None => println!("Recorded {:?}", text),
        }
        println!("Statements: {}", count);
    }
    Ok(())
}

/// Split a conversation file into conversations.
///
/// Blank lines separate conversations; `#` lines are comments.
pub fn parse_conversations(content: &str) -> Vec<Vec<String>> {
    let mut conversations = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                conversations.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line.to_string());
    }
    if !current.is_empty() {
        conversations.push(current);
    }

    conversations
}

/// Record conversations from a text file.
pub fn cmd_train(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    file: &Path,
) -> Result<(), RiposteError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_TRAIN_FILE_SIZE)?;

    let content = std::fs::read_to_string(&validated_path)
        .map_err(|e| RiposteError::IoError(format!("Read file: {}", e)))?;
    let conversations = parse_conversations(&content);

    let mut session = load_or_create_session(db_path, backend)?;
    let mut statements = 0usize;
    for conversation in &conversations {
        session.record_conversation(conversation.as_slice())?;
        statements += conversation.len();
    }
    save_session(&session, db_path)?;

    tracing::info!(
        conversations = conversations.len(),
        statements,
        "Training complete"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "conversations": conversations.len(),
            "statements": statements,
            "statement_count": session.statement_count()?,
        }));
    } else {
        println!(
            "Trained on {} conversations ({} statements)",
            conversations.len(),
            statements
        );
    }
    Ok(())
}

/// Remove one statement.
pub fn cmd_forget(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    text: &str,
) -> Result<(), RiposteError> {
    let mut session = load_or_create_session(db_path, backend)?;
    let removed = session.forget(text)?;
    if removed {
        save_session(&session, db_path)?;
    }

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "removed": removed }));
    } else if removed {
        println!("Removed {:?}", text);
    } else {
        println!("No statement {:?}", text);
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the corpus as a snapshot.
pub fn cmd_export(db_path: &Path, backend: Backend, output: &Path) -> Result<(), RiposteError> {
    let validated_output = validate_output_path(output)?;

    let session = load_or_create_session(db_path, backend)?;
    let data = corpus_to_bytes(&session.export_records()?)?;
    println!("Checksum: {}", snapshot_checksum(&data));

    std::fs::write(&validated_output, &data)
        .map_err(|e| RiposteError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a snapshot into the corpus.
///
/// Records with a known text replace the stored record; others are appended.
pub fn cmd_import(db_path: &Path, backend: Backend, input: &Path) -> Result<(), RiposteError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| RiposteError::IoError(format!("Read file: {}", e)))?;
    let records = corpus_from_bytes(&data)?;

    let mut session = load_or_create_session(db_path, backend)?;
    let written = session.import_records(records)?;
    save_session(&session, db_path)?;

    println!(
        "Imported {} records; corpus now holds {} statements",
        written,
        session.statement_count()?
    );

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(db_path: &Path, backend: Backend, force: bool) -> Result<(), RiposteError> {
    if db_path.exists() {
        if !force {
            return Err(RiposteError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| RiposteError::IoError(format!("Remove existing database: {}", e)))?;
    }

    match backend {
        Backend::Redb => {
            let _session = Session::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        Backend::File => {
            save_session(&Session::new(), db_path)?;
            println!("Initialized new file database at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load or create a session from a database path with specified backend.
pub fn load_or_create_session(db_path: &Path, backend: Backend) -> Result<Session, RiposteError> {
    load_session_with_seed(db_path, backend, None)
}

/// Like `load_or_create_session`, seeding the corpus random fallback.
pub fn load_session_with_seed(
    db_path: &Path,
    backend: Backend,
    seed: Option<u64>,
) -> Result<Session, RiposteError> {
    match (backend, seed) {
        (Backend::Redb, Some(seed)) => Session::with_redb_seed(db_path, seed),
        (Backend::Redb, None) => Session::with_redb(db_path),
        (Backend::File, seed) => {
            if !db_path.exists() {
                return Ok(match seed {
                    Some(seed) => Session::with_memory(MemoryCorpus::with_seed(seed)),
                    None => Session::new(),
                });
            }
            let data = std::fs::read(db_path)
                .map_err(|e| RiposteError::IoError(format!("Read db: {}", e)))?;
            let records: Vec<StatementRecord> = corpus_from_bytes(&data)?;
            let corpus = match seed {
                Some(seed) => MemoryCorpus::from_records_with_seed(records, seed)?,
                None => MemoryCorpus::from_records(records)?,
            };
            Ok(Session::with_memory(corpus))
        }
    }
}

/// Save a session to a database path.
pub fn save_session(session: &Session, db_path: &Path) -> Result<(), RiposteError> {
    if session.is_persistent() {
        // Redb backend - already persisted, nothing to do
        return Ok(());
    }
    let data = corpus_to_bytes(&session.export_records()?)?;
    std::fs::write(db_path, &data)
        .map_err(|e| RiposteError::IoError(format!("Write db: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!(Backend::parse("file").expect("parse"), Backend::File);
        assert_eq!(Backend::parse(" REDB ").expect("parse"), Backend::Redb);
        assert!(Backend::parse("sqlite").is_err());
    }

    #[test]
    fn conversations_split_on_blank_lines() {
        let content = "# greetings\nhello\nhi\n\n\nbye\ngoodbye\nsee you\n";
        let conversations = parse_conversations(content);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0], vec!["hello", "hi"]);
        assert_eq!(conversations[1], vec!["bye", "goodbye", "see you"]);
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.snap");

        let mut session = load_or_create_session(&db, Backend::File).expect("create");
        session
            .record_conversation(&["hello", "hi"])
            .expect("record");
        save_session(&session, &db).expect("save");

        let reloaded = load_or_create_session(&db, Backend::File).expect("reload");
        assert_eq!(reloaded.statement_count().expect("count"), 2);
        assert_eq!(
            reloaded.export_records().expect("records"),
            session.export_records().expect("records")
        );
    }

    #[test]
    fn train_then_respond_on_redb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.redb");
        let file = dir.path().join("dialogs.txt");
        std::fs::write(&file, "hello\nhi there\n").expect("write");

        cmd_train(&db, Backend::Redb, true, &file).expect("train");

        let config = riposte_core::ResponderConfig::default();
        let chain = config.build_chain().expect("chain");
        let mut session = load_or_create_session(&db, Backend::Redb).expect("open");
        let mut rng = make_rng(Some(1));
        let turn = session
            .respond(&chain, "hello", ExtraData::new(), false, &mut rng)
            .expect("respond");
        assert_eq!(turn.response.text, "hi there");
    }

    fn unlinked_corpus(db: &Path, backend: Backend) {
        let mut session = load_or_create_session(db, backend).expect("create");
        for i in 0..50 {
            session
                .record(&Statement::new(format!("s{}", i)), None)
                .expect("record");
        }
        save_session(&session, db).expect("save");
    }

    fn exact_no_learn() -> ResponderConfig {
        ResponderConfig {
            response_match: riposte_core::ResponseMatch::Exact,
            learn: false,
            ..ResponderConfig::default()
        }
    }

    #[test]
    fn seeded_fallback_is_reproducible_on_file_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.snap");
        unlinked_corpus(&db, Backend::File);
        let config = exact_no_learn();

        let answers: Vec<String> = (0..5)
            .map(|_| {
                respond_once(&db, Backend::File, &config, "zzzzzzzz", true, Some(7))
                    .expect("respond")
                    .response
                    .text
            })
            .collect();
        assert!(answers.iter().all(|a| a == &answers[0]), "{:?}", answers);
    }

    #[test]
    fn seeded_fallback_is_reproducible_on_redb_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.redb");
        unlinked_corpus(&db, Backend::Redb);
        let config = exact_no_learn();

        let answers: Vec<String> = (0..5)
            .map(|_| {
                respond_once(&db, Backend::Redb, &config, "zzzzzzzz", true, Some(7))
                    .expect("respond")
                    .response
                    .text
            })
            .collect();
        assert!(answers.iter().all(|a| a == &answers[0]), "{:?}", answers);
    }

    #[test]
    fn chat_keeps_learned_turns_when_a_later_line_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.snap");
        let mut session = load_or_create_session(&db, Backend::File).expect("create");
        session
            .record_conversation(&["hello", "hi"])
            .expect("record");
        save_session(&session, &db).expect("save");

        let chain = ResponderConfig::default().build_chain().expect("chain");
        let input = format!("hello\nfresh words\n{}\n", "x".repeat(70_000));
        let mut rng = make_rng(Some(3));
        let result = chat_loop(
            &mut session,
            &chain,
            std::io::Cursor::new(input),
            true,
            &mut rng,
            &db,
            true,
        );
        assert!(matches!(result, Err(RiposteError::InvalidStatement(_))));

        let reloaded = load_or_create_session(&db, Backend::File).expect("reload");
        let records = reloaded.export_records().expect("records");
        let fresh = records
            .iter()
            .find(|r| r.text == "fresh words")
            .expect("learned line saved");
        assert!(fresh.in_response_to.iter().any(|link| link.text == "hi"));
    }

    #[test]
    fn init_refuses_existing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("corpus.snap");
        cmd_init(&db, Backend::File, false).expect("init");
        assert!(cmd_init(&db, Backend::File, false).is_err());
        cmd_init(&db, Backend::File, true).expect("force init");
    }

    #[test]
    fn export_import_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("source.snap");
        let target = dir.path().join("target.redb");
        let snapshot = dir.path().join("export.snap");

        cmd_record(&source, Backend::File, true, "hello", None).expect("record");
        cmd_record(&source, Backend::File, true, "hi", Some("hello")).expect("record");
        cmd_export(&source, Backend::File, &snapshot).expect("export");
        cmd_import(&target, Backend::Redb, &snapshot).expect("import");

        let imported = load_or_create_session(&target, Backend::Redb).expect("open");
        assert_eq!(imported.statement_count().expect("count"), 2);
    }
}
