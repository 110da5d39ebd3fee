use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let docs_dir = root.join("normativas");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(
        docs_dir.join("DB_HS_salubridad.txt"),
        "Sección HS 3. Calidad del aire interior.\n\n\
         Los garajes dispondrán de un sistema de ventilación que garantice la extracción \
         del monóxido de carbono, con un caudal mínimo de 120 litros por segundo y plaza.",
    )
    .unwrap();
    fs::write(
        docs_dir.join("DB_SI_incendios.md"),
        "Los recorridos de evacuación hasta alguna salida de planta no excederán de \
         cincuenta metros cuando el recinto disponga de más de una salida.",
    )
    .unwrap();

    fs::write(
        root.join("tickets.json"),
        r#"[
  {"id": 7, "cliente": "Estudio Sur", "consulta": "aislamiento térmico en muros",
   "status": "resuelto", "respuesta": "Aplique la transmitancia límite del DB HE 1.",
   "fecha_creacion": "2024-05-10T09:00:00", "fecha_respuesta": "2024-05-10T12:15:00"},
  {"id": 8, "cliente": "Obras Norte", "consulta": "aislamiento térmico en fachadas",
   "status": "pendiente", "fecha_creacion": "2024-05-11T09:00:00"}
]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[corpus]
normativas_dir = "{root}/normativas"
tickets_file = "{root}/tickets.json"

[chunking]
max_chunk_size = 500
min_chunk_chars = 30

[retrieval]
default_k = 5
ticket_k = 3

[embedding]
provider = "hash"
dims = 256
"#,
        root = root.display()
    );

    let config_path = config_dir.join("nrag.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_nrag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_nrag"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run nrag binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_stats_reports_corpus_sizes() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_nrag(&config, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("documents:        2"), "{}", stdout);
    assert!(stdout.contains("normativa chunks: 2"), "{}", stdout);
    assert!(stdout.contains("resolved tickets: 1"), "{}", stdout);
}

#[test]
fn test_search_json() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_nrag(
        &config,
        &["search", "ventilación garajes", "--k", "1", "--json"],
    );
    assert!(success, "search failed: {}", stderr);

    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["document"], "DB HS salubridad");
    assert!(hits[0]["score"].as_f64().is_some());
    assert!(hits[0]["similarity"].as_f64().is_some());
}

#[test]
fn test_similar_lexical_json() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_nrag(
        &config,
        &[
            "similar",
            "aislamiento térmico en fachadas",
            "--strategy",
            "lexical",
            "--json",
        ],
    );
    assert!(success, "similar failed: {}", stderr);

    let matches: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["id"], 7);
    assert_eq!(matches[0]["status"], "resuelto");
    assert!(matches[0].get("distance").is_none());
    let score = matches[0]["similarity_score"].as_f64().unwrap();
    assert!((score - 0.85).abs() < 1e-4);
}

#[test]
fn test_similar_rejects_unknown_strategy() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_nrag(&config, &["similar", "q", "--strategy", "fuzzy"]);
    assert!(!success);
    assert!(stderr.contains("fuzzy"), "{}", stderr);
}

#[test]
fn test_answer_uses_template() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_nrag(&config, &["answer", "ventilación de garajes"]);
    assert!(success, "answer failed: {}", stderr);
    assert!(stdout.starts_with("Información relevante para: \"ventilación de garajes\""));
    assert!(stdout.contains("DB HS salubridad (similitud:"));
}

#[test]
fn test_search_empty_corpus_fails() {
    let (tmp, config) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("normativas")).unwrap();

    let (_, stderr, success) = run_nrag(&config, &["search", "ventilación"]);
    assert!(!success);
    assert!(stderr.contains("engine not ready"), "{}", stderr);
}

#[test]
fn test_chunk_dry_run() {
    let (tmp, config) = setup_test_env();
    let file = tmp.path().join("normativas").join("DB_HS_salubridad.txt");
    let (stdout, stderr, success) = run_nrag(
        &config,
        &["chunk", file.to_str().unwrap(), "--max-chunk-size", "40"],
    );
    assert!(success, "chunk failed: {}", stderr);
    assert!(stdout.contains("--- chunk 0"));
    assert!(stdout.contains("--- chunk 1"));
    assert!(stdout.trim_end().ends_with("2 chunks"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_nrag(&tmp.path().join("absent.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "{}", stderr);
}
