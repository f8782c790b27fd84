//! Per-statement profiling protocol and the sequential batch driver.

use serde::{Deserialize, Serialize};

use std::fmt::Display;

use crate::{
    BlockIoRow, CategoryRow, CpuRow, MemoryRow, ProfileCategory, ProfileRow, QprofError,
    QprofResult, Report, StatementProfile, aggregate,
};

/// One live database session with statement-scoped profiling.
///
/// Profiling commands always refer to the most recently executed statement on
/// this session, so implementations must not be shared between callers.
pub trait Session {
    type Error: Display;

    fn enable_profiling(&mut self) -> Result<(), Self::Error>;

    /// Runs `sql` verbatim and consumes every result set it produces.
    /// Returns the number of rows discarded.
    fn execute_and_drain(&mut self, sql: &str) -> Result<u64, Self::Error>;

    fn show_profile(&mut self, category: ProfileCategory) -> Result<Vec<ProfileRow>, Self::Error>;

    /// Best-effort release. Errors are not reported.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Executes one statement and collects its profile.
///
/// Fails with [`QprofError::Execution`] when the statement itself fails and
/// [`QprofError::Profiling`] when profiling could not be enabled or retrieved.
pub fn execute_statement<S: Session>(
    session: &mut S,
    statement: &str,
) -> QprofResult<StatementProfile> {
    session
        .enable_profiling()
        .map_err(|e| QprofError::Profiling(format!("enable profiling: {e}")))?;
    tracing::debug!("profiling enabled");

    tracing::info!("executing statement: {statement}");
    let drained = session
        .execute_and_drain(statement)
        .map_err(|e| QprofError::Execution(e.to_string()))?;
    tracing::debug!("statement executed, {drained} result rows discarded");

    let cpu = fetch_category::<S, CpuRow>(session)?;
    let memory = fetch_category::<S, MemoryRow>(session)?;
    let block_io = fetch_category::<S, BlockIoRow>(session)?;

    Ok(aggregate(cpu, memory, block_io))
}

fn fetch_category<S: Session, R: CategoryRow>(session: &mut S) -> QprofResult<Vec<R>> {
    let category = R::CATEGORY;
    tracing::debug!("retrieving {} profile", category.show_profile_type());
    let rows = session
        .show_profile(category)
        .map_err(|e| QprofError::Profiling(format!("show profile {category}: {e}")))?;
    rows.into_iter()
        .map(|row| {
            let got = row.category();
            R::from_row(row).ok_or_else(|| {
                QprofError::Profiling(format!("expected {category} row, got {got} row"))
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatementFailure {
    pub statement: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub report: Report,
    pub attempted: usize,
    pub failures: Vec<StatementFailure>,
}

impl BatchOutcome {
    /// Distinct statements that ended up in the report. A statement text run
    /// more than once counts once.
    pub fn profiled(&self) -> usize {
        self.report.len()
    }
}

/// Runs every statement in order on one session.
///
/// A statement that fails is logged, recorded in `failures` and left out of
/// the report; the batch always proceeds to the next statement.
pub fn run_batch<S: Session>(session: &mut S, statements: &[String]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (idx, statement) in statements.iter().enumerate() {
        outcome.attempted += 1;
        match execute_statement(session, statement) {
            Ok(profile) => {
                tracing::info!(
                    "statement {} of {} profiled ({} cpu stages)",
                    idx + 1,
                    statements.len(),
                    profile.cpu_rows.len()
                );
                outcome.report.insert(statement.clone(), profile);
            }
            Err(err) => {
                tracing::warn!("statement {} of {} skipped: {err}", idx + 1, statements.len());
                outcome.failures.push(StatementFailure {
                    statement: statement.clone(),
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    /// Scripted in-memory session. Statements listed in `failing` error on
    /// execution, those in `drain_failing` error while their results are
    /// consumed, and `unprofilable` pairs error on that category's retrieval.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSession {
        pub(crate) failing: Vec<String>,
        pub(crate) drain_failing: Vec<String>,
        pub(crate) unprofilable: Vec<(String, ProfileCategory)>,
        pub(crate) cpu: HashMap<String, Vec<ProfileRow>>,
        pub(crate) profiling_disabled: bool,
        pub(crate) log: Vec<String>,
        pub(crate) last: Option<String>,
    }

    impl FakeSession {
        pub(crate) fn with_cpu(mut self, sql: &str, rows: Vec<(&str, i64, i64, i64)>) -> Self {
            let rows = rows
                .into_iter()
                .map(|(stage, d, u, s)| {
                    ProfileRow::Cpu(CpuRow {
                        stage: stage.to_string(),
                        duration: Decimal::new(d, 6),
                        cpu_user: Decimal::new(u, 6),
                        cpu_system: Decimal::new(s, 6),
                    })
                })
                .collect();
            self.cpu.insert(sql.to_string(), rows);
            self
        }
    }

    impl Session for FakeSession {
        type Error = String;

        fn enable_profiling(&mut self) -> Result<(), String> {
            self.log.push("enable".to_string());
            if self.profiling_disabled {
                return Err("profiling is disabled".to_string());
            }
            Ok(())
        }

        fn execute_and_drain(&mut self, sql: &str) -> Result<u64, String> {
            self.log.push(format!("execute {sql}"));
            if self.failing.iter().any(|s| s == sql) {
                return Err(format!("You have an error in your SQL syntax near '{sql}'"));
            }
            if self.drain_failing.iter().any(|s| s == sql) {
                return Err("Lost connection to MySQL server during query".to_string());
            }
            self.last = Some(sql.to_string());
            Ok(1)
        }

        fn show_profile(&mut self, category: ProfileCategory) -> Result<Vec<ProfileRow>, String> {
            self.log.push(format!("show {category}"));
            let last = self.last.clone().unwrap_or_default();
            if self
                .unprofilable
                .iter()
                .any(|(sql, c)| *sql == last && *c == category)
            {
                return Err("lost connection".to_string());
            }
            match category {
                ProfileCategory::Cpu => Ok(self.cpu.get(&last).cloned().unwrap_or_default()),
                ProfileCategory::Memory => Ok(vec![ProfileRow::Memory(MemoryRow {
                    stage: "starting".to_string(),
                    duration: Decimal::new(10, 6),
                    allocation: Some(Decimal::new(512, 0)),
                })]),
                ProfileCategory::BlockIo => Ok(Vec::new()),
            }
        }
    }

    #[test]
    fn protocol_runs_steps_in_order() {
        let mut session = FakeSession::default().with_cpu("SELECT 1", vec![("starting", 5, 3, 1)]);
        let profile = execute_statement(&mut session, "SELECT 1").expect("profile");
        assert_eq!(
            session.log,
            vec![
                "enable",
                "execute SELECT 1",
                "show cpu",
                "show memory",
                "show block_io"
            ]
        );
        assert_eq!(profile.total_cpu_user, Decimal::new(3, 6));
        assert!(profile.memory_available);
        assert_eq!(profile.total_memory, Decimal::new(512, 0));
        assert!(!profile.has_block_io());
    }

    #[test]
    fn execution_failure_is_execution_error_and_skips_profiling() {
        let mut session = FakeSession {
            failing: vec!["SELEC 1".to_string()],
            ..FakeSession::default()
        };
        let err = execute_statement(&mut session, "SELEC 1").expect_err("must fail");
        assert!(matches!(err, QprofError::Execution(_)), "got {err:?}");
        assert_eq!(session.log, vec!["enable", "execute SELEC 1"]);
    }

    #[test]
    fn drain_failure_is_execution_error() {
        let mut session = FakeSession {
            drain_failing: vec!["SELECT * FROM big".to_string()],
            ..FakeSession::default()
        };
        let err = execute_statement(&mut session, "SELECT * FROM big").expect_err("must fail");
        assert!(matches!(err, QprofError::Execution(_)), "got {err:?}");
        assert_eq!(session.log, vec!["enable", "execute SELECT * FROM big"]);

        let outcome = run_batch(&mut session, &["SELECT * FROM big".to_string()]);
        assert!(outcome.report.is_empty());
        assert_eq!(outcome.failures[0].kind, "execution");
    }

    #[test]
    fn retrieval_failure_is_profiling_error() {
        let expected_logs = [
            (ProfileCategory::Cpu, vec!["enable", "execute SELECT 1", "show cpu"]),
            (
                ProfileCategory::Memory,
                vec!["enable", "execute SELECT 1", "show cpu", "show memory"],
            ),
            (
                ProfileCategory::BlockIo,
                vec![
                    "enable",
                    "execute SELECT 1",
                    "show cpu",
                    "show memory",
                    "show block_io",
                ],
            ),
        ];
        for (category, expected_log) in expected_logs {
            let mut session = FakeSession {
                unprofilable: vec![("SELECT 1".to_string(), category)],
                ..FakeSession::default()
            }
            .with_cpu("SELECT 1", vec![("starting", 5, 3, 1)]);
            let err = execute_statement(&mut session, "SELECT 1").expect_err("must fail");
            match &err {
                QprofError::Profiling(msg) => {
                    assert!(msg.starts_with(&format!("show profile {category}")), "{msg}")
                }
                other => panic!("expected profiling error for {category}, got {other:?}"),
            }
            assert_eq!(err.kind(), "profiling");
            assert_eq!(session.log, expected_log);

            session.log.clear();
            let outcome = run_batch(&mut session, &["SELECT 1".to_string()]);
            assert!(outcome.report.get("SELECT 1").is_none(), "{category}");
            assert_eq!(outcome.profiled(), 0);
            assert_eq!(outcome.failures.len(), 1);
            assert_eq!(outcome.failures[0].kind, "profiling");
        }
    }

    #[test]
    fn enable_failure_is_profiling_error() {
        let mut session = FakeSession {
            profiling_disabled: true,
            ..FakeSession::default()
        };
        let err = execute_statement(&mut session, "SELECT 1").expect_err("must fail");
        assert!(matches!(err, QprofError::Profiling(_)), "got {err:?}");
        assert_eq!(session.log, vec!["enable"]);
    }

    #[test]
    fn mismatched_category_row_is_rejected() {
        struct Crossed;
        impl Session for Crossed {
            type Error = String;
            fn enable_profiling(&mut self) -> Result<(), String> {
                Ok(())
            }
            fn execute_and_drain(&mut self, _sql: &str) -> Result<u64, String> {
                Ok(0)
            }
            fn show_profile(&mut self, _c: ProfileCategory) -> Result<Vec<ProfileRow>, String> {
                Ok(vec![ProfileRow::BlockIo(BlockIoRow {
                    stage: "x".to_string(),
                    duration: Decimal::ZERO,
                    reads: 0,
                    writes: 0,
                })])
            }
        }
        let err = execute_statement(&mut Crossed, "SELECT 1").expect_err("must fail");
        match err {
            QprofError::Profiling(msg) => assert!(msg.contains("expected cpu row"), "{msg}"),
            other => panic!("expected profiling error, got {other:?}"),
        }
    }

    #[test]
    fn batch_skips_failed_statements_and_continues() {
        let mut session = FakeSession {
            failing: vec!["SELECT broken".to_string()],
            unprofilable: vec![("SELECT 3".to_string(), ProfileCategory::Memory)],
            ..FakeSession::default()
        }
        .with_cpu("SELECT 1", vec![("starting", 2000, 1500, 0), ("end", 1000, 500, 0)])
        .with_cpu("SELECT 4", vec![("starting", 1, 1, 1)]);

        let statements: Vec<String> = ["SELECT 1", "SELECT broken", "SELECT 3", "SELECT 4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = run_batch(&mut session, &statements);

        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.profiled(), 2);
        let keys: Vec<&str> = outcome
            .report
            .entries()
            .iter()
            .map(|e| e.statement.as_str())
            .collect();
        assert_eq!(keys, vec!["SELECT 1", "SELECT 4"]);
        assert!(outcome.report.get("SELECT broken").is_none());
        assert!(outcome.report.get("SELECT 3").is_none());
        assert_eq!(
            outcome.report.get("SELECT 1").map(|p| p.total_cpu_user),
            Some(Decimal::new(2000, 6))
        );
        let kinds: Vec<&str> = outcome.failures.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["execution", "profiling"]);
    }

    #[test]
    fn repeated_statement_counts_once() {
        let mut session = FakeSession::default().with_cpu("SELECT 1", vec![("starting", 5, 3, 1)]);
        let statements = vec!["SELECT 1".to_string(), "SELECT 1".to_string()];
        let outcome = run_batch(&mut session, &statements);
        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.report.len(), 1);
        assert_eq!(outcome.profiled(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn statement_without_cpu_rows_is_still_reported() {
        let mut session = FakeSession::default();
        let outcome = run_batch(&mut session, &["SET @a = 1".to_string()]);
        let profile = outcome.report.get("SET @a = 1").expect("entry");
        assert!(!profile.cpu_available);
        assert!(outcome.failures.is_empty());
    }
}
