//! Employee administration: role and supervisor edits, activation toggles

use std::sync::Arc;

use tracing::info;

use super::listing::{Confirmation, ListPage, ListRow};
use crate::api::AdminApi;
use crate::config::Config;
use crate::session::Session;
use crate::types::{DisplayStatus, Employee, EmployeeState, Role};

impl ListRow for Employee {
    type Key = u64;

    fn key(&self) -> u64 {
        self.legajo
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.legajo,
            self.nombre,
            self.apellido,
            self.email,
            self.rol,
            self.display_status().label()
        )
    }
}

/// Status selector shown next to the text filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Pending,
    Inactive,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Active,
        StatusFilter::Pending,
        StatusFilter::Inactive,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "Todos",
            StatusFilter::Active => "Activos",
            StatusFilter::Pending => "Pendientes",
            StatusFilter::Inactive => "Inactivos",
        }
    }

    pub fn accepts(self, status: DisplayStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == DisplayStatus::Active,
            StatusFilter::Pending => status == DisplayStatus::Pending,
            StatusFilter::Inactive => status == DisplayStatus::Inactive,
        }
    }

    /// Next entry of the selector, wrapping
    pub fn cycle(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeAction {
    ToggleStatus(u64),
}

pub struct EmployeesPage {
    api: Arc<dyn AdminApi>,
    page: ListPage<Employee>,
    status_filter: StatusFilter,
    confirmation: Option<Confirmation<EmployeeAction>>,
}

impl EmployeesPage {
    pub fn new(api: Arc<dyn AdminApi>, session: Session, config: &Config) -> Self {
        Self {
            api,
            page: ListPage::new(session, config.ui.page_size),
            status_filter: StatusFilter::All,
            confirmation: None,
        }
    }

    pub async fn load(&mut self) {
        let result = self.api.employees(self.page.cancel_token()).await;
        self.page.accept_load("Error de Carga", result);
    }

    pub fn page(&self) -> &ListPage<Employee> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ListPage<Employee> {
        &mut self.page
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        let predicate = match filter {
            StatusFilter::All => None,
            other => Some(Box::new(move |e: &Employee| other.accepts(e.display_status()))
                as Box<dyn Fn(&Employee) -> bool + Send + Sync>),
        };
        self.page.list_mut().set_predicate(predicate);
    }

    /// Change role and supervisor. Only advisors report to a supervisor.
    pub fn update_role(&mut self, legajo: u64, rol: Role, supervisor_id: Option<u64>) -> bool {
        let supervisor_id = if rol == Role::Advisor {
            supervisor_id
        } else {
            None
        };
        let api = Arc::clone(&self.api);
        let cancel = self.page.cancel_token().clone();
        info!(legajo, %rol, "updating employee role");
        self.page.mutate(
            &legajo,
            "Error al Actualizar",
            |e| {
                e.rol = rol;
                e.supervisor_id = supervisor_id;
            },
            async move {
                api.update_employee_role(legajo, rol, supervisor_id, &cancel)
                    .await
            },
        )
    }

    /// Supervisors an advisor can be assigned to
    pub fn supervisors(&self) -> Vec<&Employee> {
        self.page
            .list()
            .items()
            .iter()
            .filter(|e| e.rol == Role::Supervisor)
            .collect()
    }

    /// Ask before flipping an account between active and inactive
    pub fn request_toggle(&mut self, legajo: u64) {
        let Some(employee) = self.page.list().get(&legajo) else {
            return;
        };
        let next = employee.estado.toggled();
        let title = match next {
            EmployeeState::Active => "Reactivar Empleado",
            EmployeeState::Inactive => "Desactivar Empleado",
        };
        self.confirmation = Some(Confirmation::new(
            title,
            format!(
                "¿Está seguro de que desea poner al empleado #{} como {}?",
                legajo,
                next.wire_name()
            ),
            EmployeeAction::ToggleStatus(legajo),
        ));
    }

    pub fn confirmation(&self) -> Option<&Confirmation<EmployeeAction>> {
        self.confirmation.as_ref()
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
    }

    /// Run the pending confirmed action
    pub fn confirm(&mut self) -> bool {
        let Some(confirmation) = self.confirmation.take() else {
            return false;
        };
        match confirmation.confirm() {
            EmployeeAction::ToggleStatus(legajo) => self.toggle_status(legajo),
        }
    }

    fn toggle_status(&mut self, legajo: u64) -> bool {
        let Some(next) = self.page.list().get(&legajo).map(|e| e.estado.toggled()) else {
            return false;
        };
        let api = Arc::clone(&self.api);
        let cancel = self.page.cancel_token().clone();
        info!(legajo, estado = next.wire_name(), "toggling employee status");
        self.page.mutate(
            &legajo,
            "Error al Cambiar Estado",
            |e| {
                e.estado = next;
                // Approving a pending registration confirms it
                e.email_confirmado = true;
            },
            async move { api.set_employee_status(legajo, next, &cancel).await },
        )
    }

    pub fn poll(&mut self) {
        self.page.poll();
    }

    pub async fn settle(&mut self) {
        self.page.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{employee, signed_in_session, AdminCall, FakeAdminApi};

    async fn loaded_page(api: &Arc<FakeAdminApi>) -> EmployeesPage {
        *api.employees.lock().unwrap() = vec![
            employee(1, Role::Administrator, EmployeeState::Active, true),
            employee(2, Role::Supervisor, EmployeeState::Active, true),
            employee(3, Role::Advisor, EmployeeState::Inactive, false),
            employee(4, Role::Advisor, EmployeeState::Inactive, true),
        ];
        let mut page = EmployeesPage::new(
            api.clone(),
            signed_in_session(Role::Administrator),
            &Config::default(),
        );
        page.load().await;
        page
    }

    fn visible(page: &EmployeesPage) -> Vec<u64> {
        page.page().list().visible().iter().map(|e| e.legajo).collect()
    }

    #[tokio::test]
    async fn test_status_filter_derives_pending() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.set_status_filter(StatusFilter::Pending);
        assert_eq!(visible(&page), vec![3]);
        page.set_status_filter(StatusFilter::Inactive);
        assert_eq!(visible(&page), vec![4]);
        page.set_status_filter(StatusFilter::All);
        assert_eq!(visible(&page).len(), 4);
    }

    #[tokio::test]
    async fn test_text_filter_matches_role_and_status() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.page_mut().list_mut().set_filter("PENDIENTE");
        assert_eq!(visible(&page), vec![3]);
        page.page_mut().list_mut().set_filter("supervisor");
        assert_eq!(visible(&page), vec![2]);
    }

    #[tokio::test]
    async fn test_toggle_requires_confirmation() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.request_toggle(3);
        assert_eq!(page.confirmation().unwrap().title, "Reactivar Empleado");
        assert!(!api.calls().contains(&AdminCall::SetStatus(3, EmployeeState::Active)));

        page.cancel_confirmation();
        assert!(!page.confirm());

        page.request_toggle(3);
        assert!(page.confirm());
        let row = page.page().list().get(&3).unwrap();
        assert_eq!(row.estado, EmployeeState::Active);
        assert!(row.email_confirmado);

        page.settle().await;
        assert!(api.calls().contains(&AdminCall::SetStatus(3, EmployeeState::Active)));
        assert!(!page.page().list().is_busy(&3));
    }

    #[tokio::test]
    async fn test_failed_role_update_is_rolled_back() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;
        api.fail_next_with(ApiError::business(400, "Supervisor inválido"));

        assert!(page.update_role(3, Role::Advisor, Some(2)));
        assert_eq!(page.page().list().get(&3).unwrap().supervisor_id, Some(2));

        page.settle().await;

        assert_eq!(page.page().list().get(&3).unwrap().supervisor_id, None);
        assert_eq!(page.page().notice().unwrap().message, "Supervisor inválido");
    }

    #[tokio::test]
    async fn test_second_mutation_on_busy_row_is_refused() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        assert!(page.update_role(4, Role::Supervisor, None));
        assert!(!page.update_role(4, Role::Administrator, None));
        assert_eq!(page.page().notice().unwrap().title, "Operación en Curso");

        page.settle().await;
        assert_eq!(page.page().list().get(&4).unwrap().rol, Role::Supervisor);
        assert_eq!(
            api.calls()
                .iter()
                .filter(|c| matches!(c, AdminCall::UpdateRole(4, ..)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_supervisor_dropped_for_non_advisors() {
        let api = Arc::new(FakeAdminApi::default());
        let mut page = loaded_page(&api).await;

        page.update_role(4, Role::Supervisor, Some(2));
        page.settle().await;
        assert!(api
            .calls()
            .contains(&AdminCall::UpdateRole(4, Role::Supervisor, None)));
        assert_eq!(page.supervisors().len(), 2);
    }

    #[tokio::test]
    async fn test_load_forbidden_ends_session() {
        let api = Arc::new(FakeAdminApi::default());
        api.fail_next_with(ApiError::forbidden(None));
        let session = signed_in_session(Role::Administrator);
        let mut page = EmployeesPage::new(api.clone(), session.clone(), &Config::default());

        page.load().await;

        assert!(!session.is_authenticated());
        assert!(page.page_mut().acknowledge_notice());
    }

    #[test]
    fn test_status_filter_cycles() {
        assert_eq!(StatusFilter::All.cycle(), StatusFilter::Active);
        assert_eq!(StatusFilter::Inactive.cycle(), StatusFilter::All);
    }
}
