//! engine-runner: headless front end for the SkillGenome scoring engine.
//!
//! Usage:
//!   engine-runner --seed 42 --data-dir ./data
//!   engine-runner --profiles talent.csv --ipc-mode

use anyhow::Result;
use serde::Serialize;
use skillgenome_core::{
    config::EngineConfig,
    engine::SkillEngine,
    policy_simulator::Policy,
    predictor::PredictionRequest,
    report::{FallbackNotice, PredictionReport},
    rng::RngBank,
    store::ProfileStore,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Predict {
        #[serde(flatten)]
        request: PredictionRequest,
    },
    RegionalRisk {
        #[serde(default)]
        state: Option<String>,
    },
    PolicySimulate {
        #[serde(default = "default_state")]
        state: String,
        #[serde(default = "default_policy")]
        policy_type: Policy,
    },
    SkillTrends,
    Status,
    Alerts,
    DataFoundation,
    StateSpecialization,
    MarketIntelligence,
    NationalDistribution,
    RegionalAnalysis,
    Health,
    Quit,
}

fn default_state() -> String {
    "Maharashtra".to_string()
}

fn default_policy() -> Policy {
    Policy::Broadband
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let profiles_path = string_arg(&args, "--profiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{data_dir}/profiles/synthetic_talent_data.csv")));

    let mut config = EngineConfig::load_or_default(data_dir)?;
    config.seed = parse_arg(&args, "--seed", config.seed);

    if !ipc_mode {
        println!("SkillGenome engine-runner");
        println!("  seed:      {}", config.seed);
        println!("  data_dir:  {data_dir}");
        println!("  profiles:  {}", profiles_path.display());
        println!();
    }

    let bank = RngBank::new(config.seed);
    let store = match ProfileStore::load_or_synthesize(&profiles_path, &config, &bank) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Could not ingest {}: {e}", profiles_path.display());
            log::warn!("Continuing with an empty store; models will be offline");
            ProfileStore::empty()
        }
    };
    let engine = SkillEngine::initialize(store, config);

    if ipc_mode {
        run_ipc_loop(&engine)?;
    } else {
        print_summary(&engine)?;
    }
    Ok(())
}

fn run_ipc_loop(engine: &SkillEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_until(b'\n', &mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        let line = String::from_utf8_lossy(&buffer);
        match respond(engine, &line)? {
            Reply::Line(out) => {
                writeln!(stdout, "{out}")?;
                stdout.flush()?;
            }
            Reply::Skip => continue,
            Reply::Quit => break,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Reply {
    Line(String),
    Skip,
    Quit,
}

/// Turn one request line into its reply. Nothing a client sends produces
/// an error body: predict requests that cannot be read get the heuristic
/// report, every other failure gets the fail-safe notice.
fn respond(engine: &SkillEngine, line: &str) -> Result<Reply> {
    if line.trim().is_empty() {
        return Ok(Reply::Skip);
    }

    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Unreadable command: {e}");
            let out = if names_predict(line) {
                to_line(&PredictionReport::heuristic_fallback())?
            } else {
                to_line(&FallbackNotice::new())?
            };
            return Ok(Reply::Line(out));
        }
    };
    if matches!(cmd, IpcCommand::Quit) {
        return Ok(Reply::Quit);
    }

    let out = match handle_command(engine, cmd) {
        Ok(out) => out,
        Err(e) => {
            log::error!("Command failed: {e}");
            to_line(&FallbackNotice::new())?
        }
    };
    Ok(Reply::Line(out))
}

/// Just the tag of a command; every other field is skipped unread, so
/// out-of-range numbers elsewhere in the line do not hide it.
#[derive(serde::Deserialize)]
struct CommandTag {
    #[serde(rename = "type")]
    kind: String,
}

/// Whether a line that failed to parse as a command was meant as a predict.
fn names_predict(line: &str) -> bool {
    serde_json::from_str::<CommandTag>(line)
        .map(|tag| tag.kind == "predict")
        .unwrap_or(false)
}

/// One response line per command.
fn handle_command(engine: &SkillEngine, cmd: IpcCommand) -> Result<String> {
    match cmd {
        IpcCommand::Predict { request } => to_line(&engine.predict(&request).into_report()),
        IpcCommand::RegionalRisk { state } => to_line(&engine.regional_risks(state.as_deref())),
        IpcCommand::PolicySimulate { state, policy_type } => {
            to_line(&engine.simulate_policy(&state, &policy_type)?)
        }
        IpcCommand::SkillTrends          => to_line(&engine.skill_trends()),
        IpcCommand::Status               => to_line(&engine.status()),
        IpcCommand::Alerts               => to_line(&engine.alerts()),
        IpcCommand::DataFoundation       => match engine.data_foundation() {
            Some(df) => to_line(&df),
            None     => Ok("{}".to_string()),
        },
        IpcCommand::StateSpecialization  => to_line(&engine.region_specializations()),
        IpcCommand::MarketIntelligence   => to_line(&engine.market_intelligence()),
        IpcCommand::NationalDistribution => to_line(&engine.national_distribution()),
        IpcCommand::RegionalAnalysis     => to_line(&engine.regional_analysis()),
        IpcCommand::Health               => to_line(&engine.health()),
        IpcCommand::Quit                 => Ok(String::new()),
    }
}

fn to_line<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn print_summary(engine: &SkillEngine) -> Result<()> {
    let status = engine.status();
    println!("=== ENGINE STATUS ===");
    println!("  active:         {}", status.active);
    println!("  accuracy:       {}", status.training_accuracy);
    println!("  dataset size:   {}", status.dataset_size);
    println!("  trained at:     {}", status.last_trained.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(reason) = &status.failure {
        println!("  failure:        {reason}");
    }

    println!();
    println!("=== REGIONAL RISK ===");
    let risks = engine.regional_risks(None);
    if risks.is_empty() {
        println!("  (No regions in dataset)");
    }
    for r in &risks {
        println!(
            "  {:<16} {:>5.1}  {:?} | divide {:.1}% | deficit {:.1}% | migration {:.1}%",
            r.region,
            r.risk_score,
            r.tier,
            r.factors.digital_divide,
            r.factors.skill_deficit,
            r.factors.migration
        );
    }

    println!();
    println!("=== SKILL TRENDS ===");
    for (domain, trend) in engine.skill_trends() {
        println!("  {domain:<16} {:?} ({:+.1}/yr)", trend.status, trend.growth_rate);
    }

    println!();
    for alert in engine.alerts() {
        println!("  [{:?}] {}: {}", alert.kind, alert.title, alert.message);
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SkillEngine {
        SkillEngine::build_test(42)
    }

    fn reply_json(engine: &SkillEngine, line: &str) -> serde_json::Value {
        match respond(engine, line).unwrap() {
            Reply::Line(out) => serde_json::from_str(&out).unwrap(),
            other => panic!("Expected a reply line for {line:?}, got {other:?}"),
        }
    }

    fn assert_fallback_notice(json: &serde_json::Value) {
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal processing error - System fail-safe active");
        assert_eq!(json["fallback"], true);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn malformed_predict_gets_heuristic_report() {
        let engine = engine();
        let expected = serde_json::to_value(PredictionReport::heuristic_fallback()).unwrap();
        for line in [
            r#"{"type":"predict","signals":{"creation_output":"72"}}"#,
            r#"{"type":"predict","signals":{"learning_hours":1e400}}"#,
            r#"{"type":"predict","signals":"high"}"#,
        ] {
            let json = reply_json(&engine, line);
            assert_eq!(json, expected, "Wrong reply for {line}");
            assert_eq!(json["core"]["score"], 55.0);
            assert_eq!(json["fallback"], true);
        }
    }

    #[test]
    fn unreadable_commands_get_fallback_notice() {
        let engine = engine();
        for line in [
            r#"{"type":"teleport"}"#,
            r#"{"state":"Punjab"}"#,
            "not json at all",
            r#"{"type":"policy_simulate","policy_type":7}"#,
        ] {
            let json = reply_json(&engine, line);
            assert_fallback_notice(&json);
            assert!(!json.to_string().contains("unknown variant"), "Parser text leaked for {line}");
        }
    }

    #[test]
    fn predict_tag_is_found_past_unreadable_fields() {
        assert!(names_predict(r#"{"signals":{"projects":1e400},"type":"predict"}"#));
        assert!(!names_predict(r#"{"type":"status","signals":{}}"#));
        assert!(!names_predict("not json"));
    }

    #[test]
    fn failing_command_gets_fallback_notice() {
        let json = reply_json(&engine(), r#"{"type":"policy_simulate","state":"Atlantis"}"#);
        assert_fallback_notice(&json);
    }

    #[test]
    fn valid_commands_are_answered() {
        let engine = engine();
        let status = reply_json(&engine, r#"{"type":"status"}"#);
        assert_eq!(status["active"], true);

        let prediction = reply_json(&engine, r#"{"type":"predict","signals":{"creation_output":72}}"#);
        assert!(prediction.get("fallback").is_none(), "Scored report must omit the flag");
        let score = prediction["core"]["score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn blank_lines_are_skipped_and_quit_stops() {
        let engine = engine();
        assert_eq!(respond(&engine, "\n").unwrap(), Reply::Skip);
        assert_eq!(respond(&engine, "   ").unwrap(), Reply::Skip);
        assert_eq!(respond(&engine, "{\"type\":\"quit\"}\n").unwrap(), Reply::Quit);
    }

    #[test]
    fn lossy_decoded_line_still_gets_a_reply() {
        let raw = b"{\"type\":\"status\xff\"}\n";
        let line = String::from_utf8_lossy(raw);
        assert_fallback_notice(&reply_json(&engine(), &line));
    }
}
