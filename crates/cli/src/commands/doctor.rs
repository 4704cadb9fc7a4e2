use std::time::Duration;

use fashiondesk_core::config::{AppConfig, LoadOptions};
use fashiondesk_core::sop::SopRegistry;
use fashiondesk_db::OrderStore;
use serde::Serialize;

use crate::commands::CommandResult;

const LLM_PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\
                 \"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_sop_registry(&config));
            checks.extend(check_async(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("sop_registry"));
            checks.push(DoctorCheck::skipped("order_snapshot"));
            checks.push(DoctorCheck::skipped("llm_reachability"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_sop_registry(config: &AppConfig) -> DoctorCheck {
    let custom = [&config.sop.order_path, &config.sop.logistics_path]
        .iter()
        .filter(|path| path.is_some())
        .count();

    match SopRegistry::from_config(&config.sop) {
        Ok(_) if custom == 0 => DoctorCheck::pass("sop_registry", "using builtin SOP documents"),
        Ok(_) => DoctorCheck::pass("sop_registry", format!("{custom} SOP file(s) loaded")),
        Err(error) => DoctorCheck::fail("sop_registry", error.to_string()),
    }
}

fn check_async(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return vec![
                DoctorCheck::fail("order_snapshot", details.clone()),
                DoctorCheck::fail("llm_reachability", details),
            ];
        }
    };

    runtime.block_on(async {
        vec![check_order_snapshot(config).await, check_llm_reachability(config).await]
    })
}

async fn check_order_snapshot(config: &AppConfig) -> DoctorCheck {
    let Some(path) = config.store.snapshot_path.as_deref() else {
        return DoctorCheck::pass(
            "order_snapshot",
            "no snapshot configured, seed orders in memory",
        );
    };

    if !path.exists() {
        return DoctorCheck::pass(
            "order_snapshot",
            format!("`{}` not created yet, seed orders will be used", path.display()),
        );
    }

    match OrderStore::open_or_seed(path).await {
        Ok(store) => DoctorCheck::pass(
            "order_snapshot",
            format!("{} orders in `{}`", store.len().await, path.display()),
        ),
        Err(error) => DoctorCheck::fail("order_snapshot", error.to_string()),
    }
}

async fn check_llm_reachability(config: &AppConfig) -> DoctorCheck {
    let timeout = Duration::from_secs(config.llm.timeout_secs.min(LLM_PROBE_TIMEOUT_SECS));
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck::fail(
                "llm_reachability",
                format!("failed to build http client: {error}"),
            );
        }
    };

    let url = format!("{}/api/tags", config.llm.base_url.trim_end_matches('/'));
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => DoctorCheck::pass(
            "llm_reachability",
            format!("reached `{}` (model `{}`)", config.llm.base_url, config.llm.model),
        ),
        Ok(response) => DoctorCheck::fail(
            "llm_reachability",
            format!("`{url}` answered with status {}", response.status().as_u16()),
        ),
        Err(error) => {
            DoctorCheck::fail("llm_reachability", format!("could not reach `{url}`: {error}"))
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn human_report_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck::pass("config_validation", "configuration loaded and validated"),
                DoctorCheck::fail("llm_reachability", "connection refused"),
                DoctorCheck::skipped("order_snapshot"),
            ],
        };

        let rendered = render_human(&report);

        assert_eq!(
            rendered,
            "doctor: one or more readiness checks failed\n\
             - [ok] config_validation: configuration loaded and validated\n\
             - [fail] llm_reachability: connection refused\n\
             - [skip] order_snapshot: skipped because configuration did not load"
        );
    }
}
