//! Screen routes and the role guard in front of them

use crate::quoter::QuoterEntry;
use crate::session::Session;
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Quoter(QuoterEntry),
    QuoteHistory,
    Employees,
    Plans,
    Prices,
    PriceView,
}

impl Route {
    /// Entries of the main menu, in display order
    pub const MENU: [Route; 6] = [
        Route::Quoter(QuoterEntry {
            edit_id: None,
            from_list: false,
        }),
        Route::QuoteHistory,
        Route::PriceView,
        Route::Prices,
        Route::Plans,
        Route::Employees,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Iniciar Sesión",
            Route::Dashboard => "Inicio",
            Route::Quoter(_) => "Nueva Cotización",
            Route::QuoteHistory => "Mis Cotizaciones",
            Route::Employees => "Gestión de Empleados",
            Route::Plans => "Planes de Cobertura",
            Route::Prices => "Gestión de Precios",
            Route::PriceView => "Consultar Listas de Precios",
        }
    }

    /// Roles allowed to open the route; `None` means any signed-in role
    fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Route::Employees | Route::Plans => Some(&[Role::Administrator]),
            Route::Prices => Some(&[Role::Administrator, Role::Supervisor]),
            Route::Quoter(_) | Route::QuoteHistory => Some(&[Role::Advisor]),
            Route::Login | Route::Dashboard | Route::PriceView => None,
        }
    }

    pub fn is_allowed_for(self, role: Role) -> bool {
        self.allowed_roles()
            .map_or(true, |roles| roles.contains(&role))
    }
}

/// Where the operator actually lands when asking for `route`
pub fn guard(route: Route, session: &Session) -> Route {
    let Some(role) = session.role() else {
        return Route::Login;
    };
    match route {
        Route::Login => Route::Dashboard,
        other if other.is_allowed_for(role) => other,
        _ => Route::Dashboard,
    }
}

/// Menu routes the role may open
pub fn menu_for(role: Role) -> Vec<Route> {
    Route::MENU
        .into_iter()
        .filter(|r| r.is_allowed_for(role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LogoutReason;
    use crate::testing::signed_in_session;

    #[test]
    fn test_signed_out_goes_to_login() {
        let session = signed_in_session(Role::Administrator);
        session.logout(LogoutReason::UserRequested);
        assert_eq!(guard(Route::Plans, &session), Route::Login);
        assert_eq!(guard(Route::PriceView, &session), Route::Login);
    }

    #[test]
    fn test_insufficient_role_goes_to_dashboard() {
        let advisor = signed_in_session(Role::Advisor);
        assert_eq!(guard(Route::Employees, &advisor), Route::Dashboard);
        assert_eq!(guard(Route::Prices, &advisor), Route::Dashboard);
        assert_eq!(guard(Route::QuoteHistory, &advisor), Route::QuoteHistory);

        let supervisor = signed_in_session(Role::Supervisor);
        assert_eq!(guard(Route::Prices, &supervisor), Route::Prices);
        assert_eq!(guard(Route::Plans, &supervisor), Route::Dashboard);
    }

    #[test]
    fn test_signed_in_login_redirects_home() {
        let session = signed_in_session(Role::Supervisor);
        assert_eq!(guard(Route::Login, &session), Route::Dashboard);
    }

    #[test]
    fn test_menu_lists_only_permitted_routes() {
        assert_eq!(
            menu_for(Role::Advisor),
            vec![
                Route::Quoter(QuoterEntry::default()),
                Route::QuoteHistory,
                Route::PriceView
            ]
        );
        assert_eq!(
            menu_for(Role::Administrator),
            vec![Route::PriceView, Route::Prices, Route::Plans, Route::Employees]
        );
    }
}
