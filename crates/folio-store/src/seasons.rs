//! Season documents and the current-season pointer

use crate::commit::{record, CommitHook};
use crate::error::{Entity, StoreError, StoreResult};
use crate::io::{self, sequence, str_field};
use crate::model::season::{initiative_value, weekly_value};
use crate::model::{
    resolve_current_season, Initiative, Role, Season, WeeklyLog, MAX_OUTCOMES, MAX_PICKS,
};
use crate::paths::PathResolver;
use crate::slug::validate_id;
use chrono::{NaiveDate, Utc};
use folio_codec::{Mapping, Value};
use std::fmt;
use std::sync::Arc;

const INITIATIVES_KEY: &str = "initiatives";
const WEEKLY_KEY: &str = "weekly";

/// Store for `<seasons>/<id>/season.yaml` and `<seasons>/current.txt`
#[derive(Clone)]
pub struct SeasonStore {
    paths: Arc<PathResolver>,
    hook: Arc<dyn CommitHook>,
}

impl fmt::Debug for SeasonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeasonStore")
            .field("seasons_dir", &self.paths.seasons_dir())
            .finish_non_exhaustive()
    }
}

impl SeasonStore {
    /// Create store
    #[must_use]
    pub fn new(paths: Arc<PathResolver>, hook: Arc<dyn CommitHook>) -> Self {
        Self { paths, hook }
    }

    /// Ids of season directories holding a `season.yaml`, sorted
    ///
    /// # Errors
    /// Fails when the seasons directory cannot be listed.
    pub async fn list_ids(&self) -> StoreResult<Vec<String>> {
        let dirs = io::list_dir(&self.paths.seasons_dir(), |kind, _| kind.is_dir()).await?;
        let mut ids = Vec::with_capacity(dirs.len());
        for id in dirs {
            if io::exists(&self.paths.season_file(&id)).await? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Read one season; `None` when missing or not matching the schema
    ///
    /// # Errors
    /// Fails when the file is not valid YAML.
    pub async fn read(&self, id: &str) -> StoreResult<Option<Season>> {
        validate_id(id, "season id")?;
        let Some(map) = io::read_mapping(&self.paths.season_file(id)).await? else {
            return Ok(None);
        };
        match Season::from_mapping(id, &map) {
            Ok(season) => Ok(Some(season)),
            Err(reason) => {
                tracing::warn!(id, %reason, "ignoring invalid season document");
                Ok(None)
            }
        }
    }

    /// All readable seasons in id order
    ///
    /// # Errors
    /// Same as [`SeasonStore::read`].
    pub async fn list(&self) -> StoreResult<Vec<Season>> {
        let mut seasons = Vec::new();
        for id in self.list_ids().await? {
            if let Some(season) = self.read(&id).await? {
                seasons.push(season);
            }
        }
        Ok(seasons)
    }

    /// Write a whole season document, creating its folder
    ///
    /// # Errors
    /// `Validation` for an empty id; otherwise write or commit errors.
    pub async fn create(&self, season: &Season) -> StoreResult<()> {
        validate_id(&season.id, "season id")?;
        let file = self.paths.season_file(&season.id);
        io::write_document(&file, &Value::Mapping(season.to_mapping())).await?;
        record(self.hook.as_ref(), &[file], &format!("season:{} write", season.id)).await?;
        tracing::info!(id = %season.id, "wrote season");
        Ok(())
    }

    /// Stored pointer value, `None` when absent or blank
    ///
    /// # Errors
    /// Fails on filesystem errors.
    pub async fn read_pointer(&self) -> StoreResult<Option<String>> {
        let text = io::read_text(&self.paths.current_season_pointer()).await?;
        let Some(id) = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        if validate_id(&id, "season id").is_err() {
            tracing::warn!(id = %id, "ignoring current season pointer that is not a season id");
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Point the current season at `id`
    ///
    /// # Errors
    /// Fails on write or commit errors.
    pub async fn set_current_id(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "season id")?;
        let file = self.paths.current_season_pointer();
        io::write_text(&file, &format!("{id}\n")).await?;
        record(self.hook.as_ref(), &[file], &format!("season:{id} set current")).await?;
        tracing::info!(id, "set current season");
        Ok(())
    }

    /// Current season id: the pointer, else the season containing today
    ///
    /// # Errors
    /// Fails when seasons cannot be read.
    pub async fn read_current_id(&self) -> StoreResult<Option<String>> {
        self.read_current_id_at(Utc::now().date_naive()).await
    }

    /// [`SeasonStore::read_current_id`] with an explicit date
    ///
    /// # Errors
    /// Fails when seasons cannot be read.
    pub async fn read_current_id_at(&self, today: NaiveDate) -> StoreResult<Option<String>> {
        if let Some(id) = self.read_pointer().await? {
            return Ok(Some(id));
        }
        let ids = self.list_ids().await?;
        let mut seasons = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(season) = self.read(id).await? {
                seasons.push(season);
            }
        }
        Ok(resolve_current_season(&ids, &seasons, today).map(str::to_string))
    }

    /// Season the current id resolves to
    ///
    /// # Errors
    /// Fails when seasons cannot be read.
    pub async fn read_current(&self) -> StoreResult<Option<Season>> {
        match self.read_current_id().await? {
            Some(id) => self.read(&id).await,
            None => Ok(None),
        }
    }

    /// Insert or update a project's initiative, then list leads first
    ///
    /// Existing outcomes are kept when `outcomes` is `None`.
    ///
    /// # Errors
    /// `NotFound` for a missing season, `Validation` for too many outcomes.
    pub async fn upsert_initiative(
        &self,
        season_id: &str,
        project_id: &str,
        role: Role,
        outcomes: Option<Vec<String>>,
    ) -> StoreResult<()> {
        if outcomes.as_ref().is_some_and(|o| o.len() > MAX_OUTCOMES) {
            return Err(StoreError::validation(format!(
                "at most {MAX_OUTCOMES} outcomes per initiative"
            )));
        }

        let message = format!("season:{season_id} upsert initiative");
        self.update_document(season_id, &message, |doc| {
            let mut list = sequence(doc, INITIATIVES_KEY);
            let initiative = Initiative::new(project_id, role)
                .with_outcomes(outcomes.clone().unwrap_or_default());
            let fresh = initiative_value(&initiative);
            let position = list
                .iter()
                .position(|i| str_field(i, "project_id") == Some(project_id));

            match position {
                Some(idx) => {
                    let mut merged = list[idx].as_mapping().cloned().unwrap_or_default();
                    if let Value::Mapping(fresh) = fresh {
                        for (key, value) in fresh {
                            let keep_outcomes = outcomes.is_none() && merged.contains_key("outcomes");
                            if keep_outcomes && key.as_str() == Some("outcomes") {
                                continue;
                            }
                            merged.insert(key, value);
                        }
                    }
                    list[idx] = Value::Mapping(merged);
                }
                None => list.push(fresh),
            }

            let (leads, others): (Vec<Value>, Vec<Value>) = list
                .into_iter()
                .partition(|i| str_field(i, "role") == Some("lead"));
            let ordered = leads.into_iter().chain(others).collect();
            doc.insert(INITIATIVES_KEY.into(), Value::Sequence(ordered));
            Ok(())
        })
        .await?;
        tracing::info!(season_id, project_id, ?role, "upserted initiative");
        Ok(())
    }

    /// Drop a project's initiative; absent ids are ignored
    ///
    /// # Errors
    /// `NotFound` for a missing season.
    pub async fn remove_initiative(&self, season_id: &str, project_id: &str) -> StoreResult<()> {
        let message = format!("season:{season_id} remove initiative {project_id}");
        self.update_document(season_id, &message, |doc| {
            let mut list = sequence(doc, INITIATIVES_KEY);
            list.retain(|i| str_field(i, "project_id") != Some(project_id));
            doc.insert(INITIATIVES_KEY.into(), Value::Sequence(list));
            Ok(())
        })
        .await
    }

    /// Replace an initiative's outcomes, keeping the first three
    ///
    /// # Errors
    /// `NotFound` for a missing season or initiative.
    pub async fn set_outcomes(
        &self,
        season_id: &str,
        project_id: &str,
        outcomes: &[String],
    ) -> StoreResult<()> {
        let kept: Vec<Value> = outcomes
            .iter()
            .take(MAX_OUTCOMES)
            .cloned()
            .map(Value::from)
            .collect();

        let message = format!("season:{season_id} update outcomes {project_id}");
        self.update_document(season_id, &message, |doc| {
            let mut list = sequence(doc, INITIATIVES_KEY);
            let entry = list
                .iter_mut()
                .find(|i| str_field(i, "project_id") == Some(project_id))
                .and_then(Value::as_mapping_mut)
                .ok_or_else(|| StoreError::not_found(Entity::Initiative, project_id))?;
            entry.insert("outcomes".into(), Value::Sequence(kept));
            doc.insert(INITIATIVES_KEY.into(), Value::Sequence(list));
            Ok(())
        })
        .await
    }

    /// Set the picks of one week, keeping the first six; weeks stay sorted
    ///
    /// # Errors
    /// `NotFound` for a missing season.
    pub async fn set_weekly_picks(
        &self,
        season_id: &str,
        week_start: &str,
        picks: &[String],
    ) -> StoreResult<()> {
        let week = weekly_value(&WeeklyLog {
            week_start: week_start.to_string(),
            picks: picks.iter().take(MAX_PICKS).cloned().collect(),
        });

        let message = format!("season:{season_id} weekly {week_start}");
        self.update_document(season_id, &message, |doc| {
            let mut weekly = sequence(doc, WEEKLY_KEY);
            match weekly
                .iter()
                .position(|w| str_field(w, "week_start") == Some(week_start))
            {
                Some(idx) => weekly[idx] = week,
                None => weekly.push(week),
            }
            weekly.sort_by(|a, b| {
                let key = |w: &Value| str_field(w, "week_start").unwrap_or_default().to_string();
                key(a).cmp(&key(b))
            });
            doc.insert(WEEKLY_KEY.into(), Value::Sequence(weekly));
            Ok(())
        })
        .await
    }

    /// Change a season's theme
    ///
    /// # Errors
    /// `NotFound` for a missing season.
    pub async fn update_theme(&self, id: &str, theme: &str) -> StoreResult<()> {
        let message = format!("season:{id} update theme");
        self.update_document(id, &message, |doc| {
            doc.insert("theme".into(), theme.into());
            Ok(())
        })
        .await
    }

    /// Move a season folder to a new id, following the pointer
    ///
    /// # Errors
    /// `NotFound` when `old_id` is missing, `AlreadyExists` when `new_id` is taken.
    pub async fn rename(&self, old_id: &str, new_id: &str) -> StoreResult<()> {
        validate_id(old_id, "season id")?;
        validate_id(new_id, "season id")?;
        if old_id == new_id {
            return Ok(());
        }
        let from = self.paths.season_dir(old_id);
        let to = self.paths.season_dir(new_id);
        if !io::exists(&from).await? {
            return Err(StoreError::not_found(Entity::Season, old_id));
        }
        if io::exists(&to).await? {
            return Err(StoreError::already_exists(Entity::Season, new_id));
        }

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| StoreError::io(&from, e))?;
        record(
            self.hook.as_ref(),
            &[from, to],
            &format!("season: rename {old_id} -> {new_id}"),
        )
        .await?;

        if self.read_pointer().await?.as_deref() == Some(old_id) {
            let pointer = self.paths.current_season_pointer();
            io::write_text(&pointer, &format!("{new_id}\n")).await?;
            record(
                self.hook.as_ref(),
                &[pointer],
                &format!("season:{new_id} set current (rename)"),
            )
            .await?;
        }
        tracing::info!(old_id, new_id, "renamed season");
        Ok(())
    }

    /// Delete a season folder, clearing the pointer if it named this season
    ///
    /// # Errors
    /// Fails on filesystem or commit errors.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        validate_id(id, "season id")?;
        let dir = self.paths.season_dir(id);
        if io::remove_dir_if_exists(&dir).await? {
            record(self.hook.as_ref(), &[dir], &format!("season:{id} delete directory")).await?;
        }

        if self.read_pointer().await?.as_deref() == Some(id) {
            let pointer = self.paths.current_season_pointer();
            io::write_text(&pointer, "\n").await?;
            record(self.hook.as_ref(), &[pointer], &format!("season:{id} clear current")).await?;
        }
        tracing::info!(id, "deleted season");
        Ok(())
    }

    async fn update_document<F>(&self, id: &str, message: &str, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Mapping) -> StoreResult<()>,
    {
        validate_id(id, "season id")?;
        let file = self.paths.season_file(id);
        let mut doc = io::read_mapping(&file)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Season, id))?;
        edit(&mut doc)?;
        io::write_document(&file, &Value::Mapping(doc)).await?;
        record(self.hook.as_ref(), &[file], message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::NoopCommitHook;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SeasonStore {
        SeasonStore::new(
            Arc::new(PathResolver::new(dir.path())),
            Arc::new(NoopCommitHook),
        )
    }

    async fn seeded(dir: &TempDir) -> SeasonStore {
        let store = store(dir);
        store
            .create(&Season::new("2025Q3", "build", "2025-07-01", "2025-09-30"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn mutations_on_missing_season_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store
            .upsert_initiative("nope", "a", Role::Lead, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.update_theme("nope", "x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn upsert_keeps_outcomes_unless_given() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;
        store
            .upsert_initiative("2025Q3", "a", Role::Supporting, Some(vec!["ship".into()]))
            .await
            .unwrap();
        store
            .upsert_initiative("2025Q3", "a", Role::Lead, None)
            .await
            .unwrap();

        let season = store.read("2025Q3").await.unwrap().unwrap();
        assert_eq!(season.initiatives.len(), 1);
        assert_eq!(season.initiatives[0].role, Role::Lead);
        assert_eq!(season.initiatives[0].outcomes, vec!["ship".to_string()]);
    }

    #[tokio::test]
    async fn too_many_outcomes_rejected_and_set_outcomes_truncates() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;
        let four: Vec<String> = ["1", "2", "3", "4"].map(String::from).to_vec();
        let err = store
            .upsert_initiative("2025Q3", "a", Role::Lead, Some(four.clone()))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        store.upsert_initiative("2025Q3", "a", Role::Lead, None).await.unwrap();
        store.set_outcomes("2025Q3", "a", &four).await.unwrap();
        let season = store.read("2025Q3").await.unwrap().unwrap();
        assert_eq!(season.initiatives[0].outcomes.len(), MAX_OUTCOMES);

        let err = store.set_outcomes("2025Q3", "zz", &four).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound { entity: Entity::Initiative, .. }
        ));
    }

    #[tokio::test]
    async fn picks_are_truncated_and_replaced() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;
        let many: Vec<String> = (1..=8).map(|i| i.to_string()).collect();
        store.set_weekly_picks("2025Q3", "2025-07-07", &many).await.unwrap();
        store
            .set_weekly_picks("2025Q3", "2025-07-07", &["only".to_string()])
            .await
            .unwrap();

        let season = store.read("2025Q3").await.unwrap().unwrap();
        assert_eq!(season.weekly.len(), 1);
        assert_eq!(season.weekly[0].picks, vec!["only".to_string()]);
    }

    #[tokio::test]
    async fn pointer_wins_over_date_fallback() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir).await;
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert_eq!(
            store.read_current_id_at(today).await.unwrap().as_deref(),
            Some("2025Q3")
        );

        store.set_current_id("2024Q1").await.unwrap();
        assert_eq!(
            store.read_current_id_at(today).await.unwrap().as_deref(),
            Some("2024Q1")
        );
    }

    #[tokio::test]
    async fn invalid_season_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = PathResolver::new(dir.path()).season_file("2025Q1");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "theme: no dates\n").unwrap();

        assert_eq!(store.read("2025Q1").await.unwrap(), None);
        assert_eq!(store.list_ids().await.unwrap(), vec!["2025Q1".to_string()]);
        assert!(store.list().await.unwrap().is_empty());
    }
}
