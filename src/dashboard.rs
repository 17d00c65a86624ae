use crate::browser::{Launcher, ReportBrowser};
use crate::report::ReportGenerator;
use crate::ui::{Choice, Ui};
use tracing::{debug, error};

pub const MENU_TITLE: &str = "System Monitoring Dashboard";
pub const MENU_OPTIONS: [&str; 3] = ["Run Monitoring", "View Reports", "Exit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    MainMenu,
    Running,
    Browsing,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    RunMonitoring,
    ViewReports,
    Exit,
    Invalid,
    /// The running action returned control.
    Finished,
}

impl MenuEvent {
    /// Accepts the option number or its label; a closed front-end exits.
    pub fn from_choice(choice: &Choice) -> Self {
        let text = match choice {
            Choice::Selected(text) => text.trim(),
            Choice::Cancelled => return MenuEvent::Invalid,
            Choice::Closed => return MenuEvent::Exit,
        };
        let index = text.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).or_else(|| {
            MENU_OPTIONS
                .iter()
                .position(|o| o.eq_ignore_ascii_case(text))
        });
        match index {
            Some(0) => MenuEvent::RunMonitoring,
            Some(1) => MenuEvent::ViewReports,
            Some(2) => MenuEvent::Exit,
            _ => MenuEvent::Invalid,
        }
    }
}

pub fn transition(state: DashboardState, event: MenuEvent) -> DashboardState {
    use DashboardState::*;
    match (state, event) {
        (MainMenu, MenuEvent::RunMonitoring) => Running,
        (MainMenu, MenuEvent::ViewReports) => Browsing,
        (MainMenu, MenuEvent::Exit) => Exited,
        (Running | Browsing, MenuEvent::Finished) => MainMenu,
        (Exited, _) => Exited,
        (state, _) => state,
    }
}

pub struct Dashboard<L> {
    generator: ReportGenerator,
    browser: ReportBrowser<L>,
}

impl<L: Launcher> Dashboard<L> {
    pub fn new(generator: ReportGenerator, browser: ReportBrowser<L>) -> Self {
        Self { generator, browser }
    }

    pub fn run(&self, ui: &mut dyn Ui) {
        let mut state = DashboardState::MainMenu;
        while state != DashboardState::Exited {
            let next = self.step(state, ui);
            debug!(from = ?state, to = ?next, "dashboard transition");
            state = next;
        }
    }

    fn step(&self, state: DashboardState, ui: &mut dyn Ui) -> DashboardState {
        match state {
            DashboardState::MainMenu => {
                let event = MenuEvent::from_choice(&ui.choose(MENU_TITLE, &MENU_OPTIONS));
                match event {
                    MenuEvent::Invalid => ui.error("Invalid option. Choose 1, 2 or 3."),
                    MenuEvent::Exit => ui.info("Goodbye!"),
                    _ => {}
                }
                transition(state, event)
            }
            DashboardState::Running => {
                if let Err(err) = self.generator.generate(ui) {
                    error!(error = %err, "monitoring run failed");
                    ui.error(&format!("Monitoring run failed: {err}"));
                }
                transition(state, MenuEvent::Finished)
            }
            DashboardState::Browsing => {
                let outcome = self.browser.browse(ui);
                debug!(?outcome, "browse finished");
                transition(state, MenuEvent::Finished)
            }
            DashboardState::Exited => DashboardState::Exited,
        }
    }
}
