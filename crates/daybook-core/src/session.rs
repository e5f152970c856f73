use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::calendar::MonthCursor;
use crate::datetime::date_key_serde;
use crate::persistence::TaskGateway;
use crate::planner::{Planner, ViewMode};

const SESSION_FILE: &str = "session.json";

/// UI state carried between invocations: active view, calendar cursor and
/// the selected day, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub view: ViewMode,
    pub cursor: MonthCursor,
    #[serde(default, with = "date_key_serde::option")]
    pub selected: Option<NaiveDate>,
}

impl Session {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            view: ViewMode::List,
            cursor: MonthCursor::containing(today),
            selected: None,
        }
    }

    pub fn capture<G: TaskGateway>(planner: &Planner<G>) -> Self {
        Self {
            view: planner.view(),
            cursor: planner.cursor(),
            selected: planner.filter().selected(),
        }
    }

    pub fn apply<G: TaskGateway>(&self, planner: &mut Planner<G>) {
        planner.restore(self.view, self.cursor, self.selected);
    }
}

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    /// Missing or unreadable state starts a fresh session.
    #[tracing::instrument(skip(self))]
    pub fn load(&self, today: NaiveDate) -> Session {
        if !self.path.exists() {
            debug!(file = %self.path.display(), "no saved session");
            return Session::fresh(today);
        }

        let parsed = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))
            .and_then(|raw| {
                serde_json::from_str::<Session>(&raw)
                    .with_context(|| format!("failed parsing {}", self.path.display()))
            });

        match parsed {
            Ok(session) => session,
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(error = %reason, "discarding saved session");
                Session::fresh(today)
            }
        }
    }

    #[tracing::instrument(skip(self, session))]
    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut temp, session)?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;
        debug!(file = %self.path.display(), "saved session");
        Ok(())
    }
}
