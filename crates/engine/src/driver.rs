//! Async host loop: commands in, snapshots and events out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::SearchEngine;
use crate::event::EngineEvent;
use crate::snapshot::Snapshot;

/// One host signal. Also the line format of replay scripts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", content = "arg", rename_all = "snake_case")]
pub enum Command {
    SetRecords(Vec<Value>),
    SetCategoryTotals(BTreeMap<String, usize>),
    DeliverResults(Option<Vec<Value>>),
    Input(String),
    Focus,
    Blur,
    PointerDownInside,
    OutsideClick,
    ClearSearch,
    SelectCategory(String),
    ShowMore(String),
    SelectRecent(String),
    SelectItem(String),
    NavigateToCategory(String),
    NavigateToAll,
    SearchForTermClicked,
    EnterPressed,
    SetAllLabel(String),
    Shutdown,
}

impl Command {
    pub fn apply_to(self, engine: &mut SearchEngine, now: Instant) {
        match self {
            Command::SetRecords(raws) => engine.set_records(raws),
            Command::SetCategoryTotals(totals) => engine.set_category_totals(totals),
            Command::DeliverResults(results) => engine.deliver_results(results),
            Command::Input(text) => engine.input(&text, now),
            Command::Focus => engine.focus(),
            Command::Blur => engine.blur(now),
            Command::PointerDownInside => engine.pointer_down_inside(),
            Command::OutsideClick => engine.outside_click(now),
            Command::ClearSearch => engine.clear_search(now),
            Command::SelectCategory(c) => engine.select_category(&c),
            Command::ShowMore(c) => engine.show_more(&c),
            Command::SelectRecent(term) => engine.select_recent(&term, now),
            Command::SelectItem(id) => engine.select_item(&id),
            Command::NavigateToCategory(c) => engine.navigate_to_category(&c),
            Command::NavigateToAll => engine.navigate_to_all(),
            Command::SearchForTermClicked => engine.search_for_term_clicked(),
            Command::EnterPressed => engine.enter_pressed(),
            Command::SetAllLabel(label) => engine.set_all_label(&label),
            Command::Shutdown => engine.shutdown(),
        }
    }
}

/// Handle for hosts to send commands, read the current snapshot and subscribe to swaps.
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    snap: Arc<ArcSwap<Snapshot>>,
    version_rx: watch::Receiver<u64>,
    join: JoinHandle<()>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: Command) -> Result<(), mpsc::error::SendError<Command>> {
        self.tx.send(cmd).await
    }

    pub fn sender(&self) -> mpsc::Sender<Command> { self.tx.clone() }

    pub fn current(&self) -> Arc<Snapshot> { self.snap.load_full() }

    pub fn subscribe(&self) -> watch::Receiver<u64> { self.version_rx.clone() }

    /// Stop the loop and wait for it; timers are cancelled before it exits.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Command::Shutdown).await;
        let _ = self.join.await;
    }
}

fn clock() -> Instant { tokio::time::Instant::now().into_std() }

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Run `engine` on a task. Returns the handle and the event stream.
pub fn spawn_engine(mut engine: SearchEngine, cap: usize) -> (EngineHandle, mpsc::UnboundedReceiver<EngineEvent>) {
    let (tx, mut rx) = mpsc::channel::<Command>(cap.max(1));
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let snap = Arc::new(ArcSwap::from_pointee(Snapshot::capture(&engine)));
    let (version_tx, version_rx) = watch::channel(engine.version());
    let snap_clone = Arc::clone(&snap);

    let join = tokio::spawn(async move {
        info!("engine loop started");
        let mut published = engine.version();
        loop {
            let deadline = engine.next_deadline();
            tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(Command::Shutdown) | None => {
                            debug!("command channel closed or shutdown requested");
                            break;
                        }
                        Some(cmd) => {
                            let now = clock();
                            engine.poll(now);
                            cmd.apply_to(&mut engine, now);
                        }
                    }
                }
                _ = wait_for(deadline) => engine.poll(clock()),
            }
            for ev in engine.drain_events() {
                let _ = event_tx.send(ev);
            }
            if engine.version() != published {
                published = engine.version();
                snap_clone.store(Arc::new(Snapshot::capture(&engine)));
                let _ = version_tx.send(published);
            }
        }
        engine.shutdown();
        for ev in engine.drain_events() {
            let _ = event_tx.send(ev);
        }
        info!("engine loop stopped");
    });

    (EngineHandle { tx, snap, version_rx, join }, event_rx)
}
