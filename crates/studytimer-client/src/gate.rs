//! Screen reachability based on the presence of credentials

use studytimer_util::GoalId;

use crate::AuthSession;

/// Screens of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Register,
    Login,
    /// Goal list
    Home,
    AddGoal,
    /// Timer for a goal; without a goal id the timer stays idle
    StartGoal(Option<GoalId>),
    UpdateGoal(GoalId),
}

impl Screen {
    /// Whether the screen needs credentials
    pub fn is_protected(&self) -> bool {
        !matches!(self, Screen::Register | Screen::Login)
    }

    pub fn path(&self) -> String {
        match self {
            Screen::Register => "/register".into(),
            Screen::Login => "/login".into(),
            Screen::Home => "/home".into(),
            Screen::AddGoal => "/add-goal".into(),
            Screen::StartGoal(None) => "/start-goal".into(),
            Screen::StartGoal(Some(id)) => format!("/start-goal/{}", id),
            Screen::UpdateGoal(id) => format!("/update-goal/{}", id),
        }
    }
}

/// A navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Application entry point
    Root,
    Screen(Screen),
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim_end_matches('/');
        let screen = match path {
            "" => return Some(Route::Root),
            "/register" => Screen::Register,
            "/login" => Screen::Login,
            "/home" => Screen::Home,
            "/add-goal" => Screen::AddGoal,
            "/start-goal" => Screen::StartGoal(None),
            _ => {
                if let Some(id) = non_empty(path.strip_prefix("/start-goal/")) {
                    Screen::StartGoal(Some(GoalId::new(id)))
                } else if let Some(id) = non_empty(path.strip_prefix("/update-goal/")) {
                    Screen::UpdateGoal(GoalId::new(id))
                } else {
                    return None;
                }
            }
        };
        Some(Route::Screen(screen))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty() && !s.contains('/'))
}

/// Decide where a route lands.
///
/// The root goes to Home with credentials, else Register. Protected
/// screens without credentials redirect to Login.
pub fn resolve(route: Route, authenticated: bool) -> Screen {
    match route {
        Route::Root if authenticated => Screen::Home,
        Route::Root => Screen::Register,
        Route::Screen(screen) if screen.is_protected() && !authenticated => Screen::Login,
        Route::Screen(screen) => screen,
    }
}

/// Resolves routes against the live credential holder
#[derive(Clone)]
pub struct SessionGate {
    session: AuthSession,
}

impl SessionGate {
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    pub fn resolve(&self, route: Route) -> Screen {
        resolve(route, self.session.is_authenticated())
    }

    /// Resolve, returning `Err(landing)` when redirected elsewhere
    pub fn enter(&self, screen: Screen) -> Result<Screen, Screen> {
        let landed = self.resolve(Route::Screen(screen.clone()));
        if landed == screen { Ok(landed) } else { Err(landed) }
    }
}
