use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::Local;
use livescript_core::{
    update, AppState, AppViewModel, FormDraft, GenerationStatus, Msg, ProductEntry, ScriptType,
};
use livescript_engine::{EngineEvent, EngineHandle, LookupError};
use livescript_logging::{script_info, script_warn};

use crate::draft::DraftFile;
use crate::effects::{product_info, EffectRunner};
use crate::render::{render, tab_line};
use crate::wizard::{self, ProductColumn, WizardCommand, HELP};

const IDLE_TICK: Duration = Duration::from_millis(250);

/// Everything the message loop reacts to.
#[derive(Debug)]
pub enum Inbound {
    Msg(Msg),
    Downloaded {
        file_name: String,
        result: Result<PathBuf, String>,
    },
    Input(String),
    InputClosed,
}

pub struct App {
    state: AppState,
    runner: EffectRunner,
    inbox: mpsc::Receiver<Inbound>,
    tx: mpsc::Sender<Inbound>,
    download_dir: Option<PathBuf>,
}

impl App {
    pub fn new(engine: EngineHandle, poll_max_attempts: u32, download_dir: Option<PathBuf>) -> Self {
        let (tx, inbox) = mpsc::channel();
        let runner = EffectRunner::new(engine, download_dir.clone(), tx.clone());
        Self {
            state: AppState::with_poll_max(poll_max_attempts),
            runner,
            inbox,
            tx,
            download_dir,
        }
    }

    /// Run one message through the reducer; returns the view when it changed.
    pub fn dispatch(&mut self, msg: Msg) -> Option<AppViewModel> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        was_dirty.then_some(view)
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn draft(&self, script_type: ScriptType) -> FormDraft {
        self.state.draft(script_type)
    }

    /// Stop the engine; unfinished requests are reported as failed.
    pub fn shutdown(&self) {
        self.runner.shutdown();
    }

    fn recv(&self) -> Option<Inbound> {
        self.inbox.recv_timeout(IDLE_TICK).ok()
    }
}

/// Submit one draft and wait until its artifact is available (and saved, when
/// a download directory is configured).
pub fn run_generate(
    app: &mut App,
    script_type: ScriptType,
    draft: FormDraft,
    out: &mut impl Write,
) -> Result<String> {
    app.dispatch(Msg::TabSelected(script_type));
    app.dispatch(Msg::DraftChanged { script_type, draft });
    app.dispatch(Msg::GenerateClicked {
        script_type,
        requested_at: Local::now().naive_local(),
    });

    let tab = app.view().tab(script_type).clone();
    if let Some(message) = &tab.validation_message {
        bail!("{script_type} form is incomplete: {message}");
    }
    writeln!(out, "{}", tab_line(&tab, true))?;

    let mut last_line = String::new();
    let mut saved: Option<PathBuf> = None;
    loop {
        match app.recv() {
            Some(Inbound::Msg(msg)) => {
                if let Some(view) = app.dispatch(msg) {
                    let line = tab_line(view.tab(script_type), true);
                    if line != last_line {
                        writeln!(out, "{line}")?;
                        last_line = line;
                    }
                }
            }
            Some(Inbound::Downloaded { file_name, result }) => match result {
                Ok(path) => {
                    writeln!(out, "saved {file_name} to {}", path.display())?;
                    saved = Some(path);
                }
                Err(err) => bail!("generated {file_name} but the download failed: {err}"),
            },
            Some(Inbound::Input(_) | Inbound::InputClosed) => {}
            None => {
                app.dispatch(Msg::Tick);
            }
        }

        let tab = app.view().tab(script_type).clone();
        if tab.is_generating {
            continue;
        }
        match tab.status {
            GenerationStatus::Completed => {
                if app.download_dir.is_none() || saved.is_some() {
                    return Ok(tab.file_url);
                }
            }
            GenerationStatus::Failed => {
                bail!("generation of {} failed", tab.file_name);
            }
            GenerationStatus::Idle | GenerationStatus::Generating => {}
        }
    }
}

/// Interactive wizard: stdin commands and engine events share one loop.
pub fn run_wizard(app: &mut App, out: &mut impl Write) -> Result<()> {
    spawn_stdin_reader(app.tx.clone());
    writeln!(out, "{HELP}")?;
    let mut shown = print_changes(out, &app.view(), &[])?;

    loop {
        let view = match app.recv() {
            Some(Inbound::Input(line)) => match wizard::parse(&line) {
                Ok(WizardCommand::Quit) => break,
                Ok(WizardCommand::Help) => {
                    writeln!(out, "{HELP}")?;
                    None
                }
                Ok(WizardCommand::Status) => {
                    shown = print_changes(out, &app.view(), &[])?;
                    None
                }
                Ok(command) => match execute(app, command) {
                    Ok(view) => view,
                    Err(err) => {
                        writeln!(out, "error: {err}")?;
                        None
                    }
                },
                Err(err) => {
                    writeln!(out, "error: {err}")?;
                    None
                }
            },
            Some(Inbound::InputClosed) => break,
            Some(Inbound::Msg(msg)) => app.dispatch(msg),
            Some(Inbound::Downloaded { file_name, result }) => {
                match result {
                    Ok(path) => writeln!(out, "saved {file_name} to {}", path.display())?,
                    Err(err) => writeln!(out, "download of {file_name} failed: {err}")?,
                }
                None
            }
            None => app.dispatch(Msg::Tick),
        };
        if let Some(view) = view {
            shown = print_changes(out, &view, &shown)?;
        }
    }

    if app.view().tabs.iter().any(|tab| tab.is_generating) {
        script_warn!("Leaving wizard with generations still in flight");
        writeln!(out, "note: unfinished generations are abandoned")?;
    }
    Ok(())
}

fn execute(app: &mut App, command: WizardCommand) -> Result<Option<AppViewModel>> {
    let active = app.view().active_tab;
    let msg = match command {
        WizardCommand::Tab(script_type) => Msg::TabSelected(script_type),
        WizardCommand::Set { field, value } => Msg::FieldEdited {
            script_type: active,
            name: field,
            value,
        },
        WizardCommand::AddProduct => Msg::ProductAdded(active),
        WizardCommand::RemoveProduct(index) => Msg::ProductRemoved {
            script_type: active,
            index,
        },
        WizardCommand::EditProduct {
            index,
            column,
            value,
        } => {
            let draft = app.draft(active);
            let mut product = draft
                .products
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow!("no product {} on this tab", index + 1))?;
            set_column(&mut product, column, value);
            Msg::ProductEdited {
                script_type: active,
                index,
                product,
            }
        }
        WizardCommand::Lookup(index) => Msg::LookupClicked {
            script_type: active,
            index,
        },
        WizardCommand::Load(path) => Msg::DraftChanged {
            script_type: active,
            draft: DraftFile::load(&path)?.into_form(),
        },
        WizardCommand::Save(path) => {
            DraftFile::from_form(&app.draft(active)).save(&path)?;
            script_info!("Saved {active} draft to {path:?}");
            return Ok(None);
        }
        WizardCommand::Generate => Msg::GenerateClicked {
            script_type: active,
            requested_at: Local::now().naive_local(),
        },
        WizardCommand::Retry => Msg::RetryClicked {
            script_type: active,
            requested_at: Local::now().naive_local(),
        },
        WizardCommand::Reset => Msg::ResetClicked(active),
        WizardCommand::Status | WizardCommand::Help | WizardCommand::Quit => Msg::NoOp,
    };
    Ok(app.dispatch(msg))
}

fn set_column(product: &mut ProductEntry, column: ProductColumn, value: String) {
    let cell = match column {
        ProductColumn::Id => &mut product.product_id,
        ProductColumn::Name => &mut product.product_name,
        ProductColumn::Price => &mut product.product_price,
        ProductColumn::Spec => &mut product.product_spec,
        ProductColumn::Sellpoint => &mut product.sellpoint,
    };
    *cell = value;
}

/// Print the lines that differ from what is already on screen.
fn print_changes(out: &mut impl Write, view: &AppViewModel, shown: &[String]) -> Result<Vec<String>> {
    let lines = render(view);
    for (i, line) in lines.iter().enumerate() {
        if shown.get(i) != Some(line) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(lines)
}

fn spawn_stdin_reader(tx: mpsc::Sender<Inbound>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Inbound::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Inbound::InputClosed);
    });
}

/// One-shot product lookup, printed as `field: value` lines.
pub fn run_lookup(
    engine: &EngineHandle,
    item_id: &str,
    timeout: Duration,
    out: &mut impl Write,
) -> Result<()> {
    engine.lookup(1, item_id)?;
    let result = loop {
        match engine.recv_timeout(timeout)? {
            Some(EngineEvent::LookupFinished { result, .. }) => break result,
            Some(_) => continue,
            None => bail!("no answer for item {item_id} within {timeout:?}"),
        }
    };
    let info = match result {
        Ok(info) => product_info(info),
        Err(LookupError::NotFound(message)) => bail!("item {item_id} not found: {message}"),
        Err(err) => return Err(err.into()),
    };
    let rows = [
        ("name", info.product_name),
        ("price", info.product_price),
        ("brand", info.brand_info),
        ("sellpoint", info.sellpoint),
    ];
    for (label, value) in rows {
        writeln!(out, "{label}: {}", value.unwrap_or_default())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livescript_core::{ANCHOR_NAME, LIVE_TIME};
    use livescript_engine::{
        ArtifactFile, ArtifactKind, ArtifactQuery, GenerationRequest, ItemInfo, JobSubmitter,
        PollPolicy, ProductLookup, QueryError, QueryOutcome, SubmitAck,
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Accept;

    impl JobSubmitter for Accept {
        fn submit(&self, _request: &GenerationRequest) -> SubmitAck {
            SubmitAck {
                success: true,
                message: "ok".into(),
            }
        }
    }

    /// Found on the given attempt, never when `found_on` is zero.
    struct FoundOn {
        found_on: u32,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl ArtifactQuery for FoundOn {
        async fn query(&self, file_name: &str) -> Result<QueryOutcome, QueryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.found_on {
                return Ok(QueryOutcome::Found(ArtifactFile {
                    kind: ArtifactKind::for_file_name(file_name),
                    file_name: file_name.to_string(),
                    url: format!("https://oss.example.com/{file_name}"),
                    path: String::new(),
                }));
            }
            Ok(QueryOutcome::NotFound)
        }
    }

    struct NoLookup;

    #[async_trait::async_trait]
    impl ProductLookup for NoLookup {
        async fn lookup(&self, _item_id: &str) -> Result<ItemInfo, LookupError> {
            Err(LookupError::Empty)
        }
    }

    fn app(found_on: u32) -> App {
        let engine = EngineHandle::with_backends(
            Box::new(Accept),
            Box::new(FoundOn {
                found_on,
                calls: AtomicU32::new(0),
            }),
            Box::new(NoLookup),
            PollPolicy {
                max_attempts: 3,
                interval: Duration::ZERO,
            },
        );
        App::new(engine, 3, None)
    }

    fn complete_draft() -> FormDraft {
        let mut draft = FormDraft::default();
        draft.products[0] = ProductEntry {
            product_id: "6523".into(),
            product_name: "山东苹果".into(),
            product_price: "19.9".into(),
            ..ProductEntry::default()
        };
        draft.set_field(LIVE_TIME, "2025-07-18 20:00");
        draft.set_field(ANCHOR_NAME, "小王");
        draft
    }

    #[test]
    fn one_shot_generation_returns_download_url() {
        let mut app = app(2);
        let mut out = Vec::new();

        let url = run_generate(&mut app, ScriptType::SingleProduct, complete_draft(), &mut out)
            .unwrap();

        assert!(url.starts_with("https://oss.example.com/AI生成_山东苹果_"));
        assert!(url.ends_with(".xlsx"));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("completed"));
    }

    #[test]
    fn one_shot_generation_fails_when_budget_runs_out() {
        let mut app = app(0);
        let err = run_generate(
            &mut app,
            ScriptType::SingleProduct,
            complete_draft(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed"));
        assert_eq!(
            app.view().tab(ScriptType::SingleProduct).status,
            GenerationStatus::Failed
        );
    }

    #[test]
    fn incomplete_form_is_rejected_before_submission() {
        let mut app = app(1);
        let mut draft = complete_draft();
        draft.set_field(ANCHOR_NAME, "");
        let err = run_generate(&mut app, ScriptType::SingleProduct, draft, &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("anchor_name"));
        assert!(!app.view().tab(ScriptType::SingleProduct).is_generating);
    }

    #[test]
    fn stopped_engine_fails_the_generation() {
        let engine = EngineHandle::with_backends(
            Box::new(Accept),
            Box::new(FoundOn {
                found_on: 1,
                calls: AtomicU32::new(0),
            }),
            Box::new(NoLookup),
            PollPolicy::default(),
        );
        engine.shutdown();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while engine.recv_timeout(Duration::from_millis(20)).is_ok() {
            assert!(std::time::Instant::now() < deadline, "engine did not stop");
        }

        let mut app = App::new(engine, 20, None);
        let err = run_generate(
            &mut app,
            ScriptType::SingleProduct,
            complete_draft(),
            &mut Vec::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("failed"));
        let tab = app.view().tab(ScriptType::SingleProduct).clone();
        assert!(!tab.is_generating);
        assert_eq!(tab.status, GenerationStatus::Failed);
    }

    #[test]
    fn wizard_commands_edit_the_active_tab() {
        let mut app = app(1);
        execute(&mut app, WizardCommand::Tab(ScriptType::SellingPoint)).unwrap();
        execute(
            &mut app,
            WizardCommand::EditProduct {
                index: 0,
                column: ProductColumn::Name,
                value: "烟台梨".into(),
            },
        )
        .unwrap();
        execute(
            &mut app,
            WizardCommand::Set {
                field: "retail_price".into(),
                value: "99".into(),
            },
        )
        .unwrap();

        let draft = app.draft(ScriptType::SellingPoint);
        assert_eq!(draft.products[0].product_name, "烟台梨");
        assert_eq!(draft.field("retail_price"), "99");
        assert_eq!(app.draft(ScriptType::SingleProduct), FormDraft::default());
        assert!(execute(
            &mut app,
            WizardCommand::EditProduct {
                index: 5,
                column: ProductColumn::Id,
                value: "1".into(),
            },
        )
        .is_err());
    }
}
