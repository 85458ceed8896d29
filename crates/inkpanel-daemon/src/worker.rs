//! Display worker: owns the panel and renderer and reacts to events.
//!
//! Renders are strictly sequential. The worker only suspends on the event
//! select and, through the driver, on the bounded busy wait.

use std::time::Duration;

use anyhow::{Context, Result};
use inkpanel_hw::{present, Error as PanelError, Framebuffer, Panel, PanelState, RefreshMode};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventReceivers};
use crate::rendering::{FrameRenderer, ScreenState};
use crate::status::{LinkStatus, StatusProbe};

/// Worker tuning taken from the configuration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub mode: RefreshMode,
    pub init_retries: u32,
    /// Hold time between composing the first status screen and pushing it
    pub settle: Duration,
    /// Periodic status re-probe
    pub status_refresh: Option<Duration>,
    pub sleep_between_updates: bool,
}

pub struct DisplayWorker<P, R, L> {
    panel: P,
    renderer: R,
    probe: StatusProbe<L>,
    settings: WorkerSettings,
    state: ScreenState,
    pushes: u64,
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl<P, R, L> DisplayWorker<P, R, L>
where
    P: Panel,
    R: FrameRenderer,
    L: LinkStatus,
{
    pub fn new(panel: P, renderer: R, probe: StatusProbe<L>, settings: WorkerSettings) -> Self {
        Self {
            panel,
            renderer,
            probe,
            settings,
            state: ScreenState::default(),
            pushes: 0,
        }
    }

    /// Number of frames successfully pushed to the panel.
    #[cfg(test)]
    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    /// Brings up the panel and shows the first real frame.
    ///
    /// Panel initialization, font and asset failures are fatal.
    pub async fn start(&mut self) -> Result<()> {
        self.panel
            .initialize_with_retry(self.settings.mode, self.settings.init_retries)
            .context("Failed to initialize panel")?;

        let welcome = self.renderer.welcome().context("Failed to render welcome screen")?;
        if let Err(e) = self.push(&welcome) {
            warn!("Failed to show welcome screen: {}", e);
        }

        self.renderer
            .load_assets()
            .context("Failed to load assets")?;

        self.state.connection = self.probe.probe();
        info!("Connectivity: {}", self.state.connection.label);
        let frame = self
            .renderer
            .compose(&self.state)
            .context("Failed to render status screen")?;

        tokio::time::sleep(self.settings.settle).await;
        if let Err(e) = self.push(&frame) {
            warn!("Failed to show status screen: {}", e);
        }
        Ok(())
    }

    /// Consumes events until shutdown is requested or every event channel
    /// has closed.
    pub async fn run(&mut self, events: &mut EventReceivers, shutdown: &mut mpsc::Receiver<()>) {
        let mut refresh = self.settings.status_refresh.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Display worker shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("All event channels closed");
                        break;
                    }
                },
                _ = tick(&mut refresh) => self.refresh_status(),
            }
        }
    }

    /// Applies an event and runs one render-and-push cycle.
    pub fn handle_event(&mut self, event: Event) {
        debug!("Event: {:?}", event);
        self.state.apply(&event);
        self.render();
    }

    fn refresh_status(&mut self) {
        let connection = self.probe.probe();
        if connection != self.state.connection {
            info!("Connectivity changed: {}", connection.label);
            self.state.connection = connection;
            self.render();
        }
    }

    fn render(&mut self) {
        let frame = match self.renderer.compose(&self.state) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Render error: {}", e);
                return;
            }
        };
        if let Err(e) = self.push(&frame) {
            warn!("Failed to update panel: {}", e);
        }
    }

    /// Sends a frame, waking the panel first if it sleeps between updates.
    ///
    /// A busy timeout while waking or refreshing triggers re-initialization;
    /// a refresh is then tried once more.
    fn push(&mut self, frame: &Framebuffer) -> inkpanel_hw::Result<()> {
        if self.panel.state() == PanelState::Sleeping {
            match self.panel.wake() {
                Err(PanelError::HardwareTimeout { waited_ms }) => self.reinitialize(waited_ms)?,
                other => other?,
            }
        }

        match present(&mut self.panel, frame) {
            Err(PanelError::HardwareTimeout { waited_ms }) => {
                self.reinitialize(waited_ms)?;
                present(&mut self.panel, frame)?;
            }
            other => other?,
        }
        self.pushes += 1;

        if self.settings.sleep_between_updates {
            self.panel.sleep()?;
        }
        Ok(())
    }

    fn reinitialize(&mut self, waited_ms: u64) -> inkpanel_hw::Result<()> {
        warn!("Panel busy for {} ms, reinitializing", waited_ms);
        self.panel
            .initialize_with_retry(self.settings.mode, self.settings.init_retries)
    }

    /// Releases the panel.
    pub fn teardown(&mut self) {
        info!("Releasing panel after {} frames", self.pushes);
        if let Err(e) = self.panel.teardown() {
            error!("Panel teardown failed: {}", e);
        }
    }
}
