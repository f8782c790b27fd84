//! MySQL adapter for the `SHOW PROFILE` command set.
//!
//! Profile rows arrive over the text protocol, so numeric cells are decoded
//! from their textual form into exact decimals.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Row, Value};
use rust_decimal::Decimal;

use std::str::FromStr;

use crate::{
    BlockIoRow, CpuRow, DatabaseConfig, MemoryRow, ProfileCategory, ProfileRow, QprofError,
    QprofResult, Session,
};

pub struct MysqlSession {
    conn: Conn,
}

impl MysqlSession {
    pub fn connect(db: &DatabaseConfig) -> QprofResult<Self> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(db.host.clone()))
            .tcp_port(db.port)
            .user(Some(db.user.clone()))
            .pass(Some(db.password.clone()))
            .db_name(Some(db.database.clone()))
            .read_timeout(db.read_timeout());
        let conn = Conn::new(opts)?;
        Ok(Self { conn })
    }
}

impl Session for MysqlSession {
    type Error = QprofError;

    fn enable_profiling(&mut self) -> QprofResult<()> {
        self.conn.query_drop("SET PROFILING = 1")?;
        Ok(())
    }

    fn execute_and_drain(&mut self, sql: &str) -> QprofResult<u64> {
        let mut result = self.conn.query_iter(sql)?;
        let mut drained = 0u64;
        while let Some(set) = result.iter() {
            for row in set {
                row?;
                drained += 1;
            }
        }
        Ok(drained)
    }

    fn show_profile(&mut self, category: ProfileCategory) -> QprofResult<Vec<ProfileRow>> {
        let rows: Vec<Row> = self
            .conn
            .query(format!("SHOW PROFILE {}", category.show_profile_type()))?;
        rows.into_iter()
            .map(|row| decode_row(category, Row::unwrap(row)))
            .collect()
    }

    fn close(mut self) {
        if let Err(err) = self.conn.query_drop("SET PROFILING = 0") {
            tracing::debug!("ignoring error while closing session: {err}");
        }
    }
}

/// Decodes one `SHOW PROFILE` row.
///
/// Column layouts: CPU `(Status, Duration, CPU_user, CPU_system)`, MEMORY
/// `(Status, Duration[, allocation])`, BLOCK IO
/// `(Status, Duration, Block_ops_in, Block_ops_out)`.
pub fn decode_row(category: ProfileCategory, values: Vec<Value>) -> QprofResult<ProfileRow> {
    let min_cols = match category {
        ProfileCategory::Memory => 2,
        ProfileCategory::Cpu | ProfileCategory::BlockIo => 4,
    };
    if values.len() < min_cols {
        return Err(QprofError::Decode(format!(
            "{category} row has {} columns, expected at least {min_cols}",
            values.len()
        )));
    }

    let stage = text_cell(&values[0])?;
    let duration = decimal_cell(&values[1])?;
    Ok(match category {
        ProfileCategory::Cpu => ProfileRow::Cpu(CpuRow {
            stage,
            duration,
            cpu_user: decimal_cell(&values[2])?,
            cpu_system: decimal_cell(&values[3])?,
        }),
        ProfileCategory::Memory => ProfileRow::Memory(MemoryRow {
            stage,
            duration,
            allocation: values.get(2).map(decimal_cell).transpose()?,
        }),
        ProfileCategory::BlockIo => ProfileRow::BlockIo(BlockIoRow {
            stage,
            duration,
            reads: count_cell(&values[2])?,
            writes: count_cell(&values[3])?,
        }),
    })
}

fn text_cell(value: &Value) -> QprofResult<String> {
    match value {
        Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        Value::NULL => Ok(String::new()),
        Value::Int(v) => Ok(v.to_string()),
        Value::UInt(v) => Ok(v.to_string()),
        other => Err(QprofError::Decode(format!("unexpected stage cell {other:?}"))),
    }
}

// NULL means the platform could not measure the figure.
fn decimal_cell(value: &Value) -> QprofResult<Decimal> {
    match value {
        Value::NULL => Ok(Decimal::ZERO),
        Value::Bytes(b) => {
            let s = std::str::from_utf8(b)
                .map_err(|e| QprofError::Decode(format!("non-utf8 decimal cell: {e}")))?
                .trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .map_err(|e| QprofError::Decode(format!("invalid decimal {s:?}: {e}")))
        }
        Value::Int(v) => Ok(Decimal::from(*v)),
        Value::UInt(v) => Ok(Decimal::from(*v)),
        Value::Float(v) => Decimal::try_from(f64::from(*v))
            .map_err(|e| QprofError::Decode(format!("invalid decimal {v}: {e}"))),
        Value::Double(v) => Decimal::try_from(*v)
            .map_err(|e| QprofError::Decode(format!("invalid decimal {v}: {e}"))),
        other => Err(QprofError::Decode(format!("unexpected decimal cell {other:?}"))),
    }
}

fn count_cell(value: &Value) -> QprofResult<u64> {
    match value {
        Value::NULL => Ok(0),
        Value::Bytes(b) => {
            let s = String::from_utf8_lossy(b);
            s.trim()
                .parse()
                .map_err(|e| QprofError::Decode(format!("invalid counter {s:?}: {e}")))
        }
        Value::Int(v) => {
            u64::try_from(*v).map_err(|e| QprofError::Decode(format!("invalid counter {v}: {e}")))
        }
        Value::UInt(v) => Ok(*v),
        other => Err(QprofError::Decode(format!("unexpected counter cell {other:?}"))),
    }
}
