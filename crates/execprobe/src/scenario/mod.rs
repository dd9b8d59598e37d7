//! The fixed scenario table every driver is checked against.

use crate::model::Scenario;
use crate::runner::{ErrorCode, HarnessError, HarnessResult};

/// Scenarios in execution order. Order carries no meaning.
pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "notty-basic",
        name: "notty: basic",
        command: "echo hello stdout; echo hello stderr >&2; exit 43",
        tty: false,
        stdin: "",
        expected_stdout: "hello stdout\n",
        expected_stderr: "hello stderr\n",
        expected_exit_code: 43,
    },
    // The sleeps catch drivers that only hand back output after exit.
    Scenario {
        id: "notty-streaming",
        name: "notty: streaming",
        command: "for n in 1 2 3; do echo $n; sleep 1; done",
        tty: false,
        stdin: "",
        expected_stdout: "1\n2\n3\n",
        expected_stderr: "",
        expected_exit_code: 0,
    },
    Scenario {
        id: "notty-stty-check",
        name: "notty: stty check",
        command: "stty size",
        tty: false,
        stdin: "",
        expected_stdout: "",
        expected_stderr: "stty: standard input: Inappropriate ioctl for device\n",
        expected_exit_code: 1,
    },
    Scenario {
        id: "notty-stdin-passing",
        name: "notty: stdin passing",
        command: "echo hello from command; cat",
        tty: false,
        stdin: "hello from stdin\n",
        expected_stdout: "hello from command\nhello from stdin\n",
        expected_stderr: "",
        expected_exit_code: 0,
    },
    // Without a tty the call must wait for every holder of stdout to exit,
    // matching `docker exec`.
    Scenario {
        id: "notty-children-processes",
        name: "notty: children processes",
        command: "(( sleep 3; echo from background ) & ); echo from main; exec sleep 1",
        tty: false,
        stdin: "",
        expected_stdout: "from main\nfrom background\n",
        expected_stderr: "",
        expected_exit_code: 0,
    },
];

#[must_use]
pub fn scenarios() -> &'static [Scenario] {
    SCENARIOS
}

#[must_use]
pub fn find_scenario(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.id == id)
}

/// Resolve a list of scenario ids. An empty filter selects the whole table.
///
/// Table order is kept regardless of filter order; duplicate ids collapse.
pub fn select_scenarios(filter: &[String]) -> HarnessResult<Vec<&'static Scenario>> {
    if filter.is_empty() {
        return Ok(SCENARIOS.iter().collect());
    }
    if let Some(unknown) = filter.iter().find(|id| find_scenario(id).is_none()) {
        return Err(HarnessError::new(
            ErrorCode::CliInvalidArg,
            format!("unknown scenario '{unknown}'"),
            Some(serde_json::json!({
                "known": SCENARIOS.iter().map(|s| s.id).collect::<Vec<_>>(),
            })),
        ));
    }
    Ok(SCENARIOS
        .iter()
        .filter(|scenario| filter.iter().any(|id| id == scenario.id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn scenario_ids_and_names_are_unique() {
        let ids: HashSet<_> = SCENARIOS.iter().map(|s| s.id).collect();
        let names: HashSet<_> = SCENARIOS.iter().map(|s| s.name).collect();
        assert_eq!(ids.len(), SCENARIOS.len());
        assert_eq!(names.len(), SCENARIOS.len());
    }

    #[test]
    fn every_scenario_runs_through_the_posix_shell_without_tty() {
        for scenario in SCENARIOS {
            let argv = scenario.argv();
            assert_eq!(argv, vec!["/bin/sh", "-c", scenario.command]);
            assert!(!scenario.tty, "{} requests a tty", scenario.id);
        }
    }

    #[test]
    fn basic_scenario_expects_distinct_streams_and_exit_43() {
        let basic = find_scenario("notty-basic");
        assert!(basic.is_some());
        if let Some(basic) = basic {
            assert_eq!(basic.expected_stdout, "hello stdout\n");
            assert_eq!(basic.expected_stderr, "hello stderr\n");
            assert_eq!(basic.expected_exit_code, 43);
        }
    }

    #[test]
    fn stdin_scenario_expects_stdin_after_the_command_prefix() {
        let scenario = find_scenario("notty-stdin-passing");
        assert!(scenario.is_some());
        if let Some(scenario) = scenario {
            assert_eq!(
                scenario.expected_stdout,
                format!("hello from command\n{}", scenario.stdin)
            );
        }
    }

    #[test]
    fn select_keeps_table_order_and_drops_duplicates() {
        let filter = vec![
            "notty-stdin-passing".to_string(),
            "notty-basic".to_string(),
            "notty-basic".to_string(),
        ];
        let selected = select_scenarios(&filter).unwrap_or_default();
        let ids: Vec<_> = selected.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["notty-basic", "notty-stdin-passing"]);
    }

    #[test]
    fn select_with_empty_filter_returns_whole_table() {
        let selected = select_scenarios(&[]).unwrap_or_default();
        assert_eq!(selected.len(), SCENARIOS.len());
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let err = select_scenarios(&["notty-nope".to_string()]).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::CliInvalidArg));
    }
}
