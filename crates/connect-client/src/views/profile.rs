use connect_types::Backend;
use connect_types::api::ProfileForm;
use connect_types::models::{Profile, Role};
use parking_lot::Mutex;
use serde::Serialize;

use super::{Admission, admit};
use crate::context::AppContext;
use crate::error::ViewError;
use crate::mutations;
use crate::routes::Route;
use crate::view::{InFlight, Outcome, ViewScope};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSnapshot {
    pub profile: Profile,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    /// The form being edited, if any.
    pub editing: Option<ProfileForm>,
}

/// The signed-in user's profile page with its edit form.
pub struct ProfileView<B> {
    ctx: AppContext<B>,
    scope: ViewScope,
    email: Option<String>,
    profile: Mutex<Profile>,
    form: Mutex<Option<ProfileForm>>,
    in_flight: InFlight,
}

impl<B: Backend> ProfileView<B> {
    pub async fn open(ctx: &AppContext<B>) -> Result<Self, ViewError> {
        let Admission { identity, profile } = admit(ctx, Route::Profile).await?;
        Ok(Self {
            ctx: ctx.clone(),
            scope: ViewScope::open(ctx.hub(), Some(identity.id)),
            email: identity.email,
            profile: Mutex::new(profile),
            form: Mutex::new(None),
            in_flight: InFlight::default(),
        })
    }

    pub fn profile(&self) -> Profile {
        self.profile.lock().clone()
    }

    pub fn is_editing(&self) -> bool {
        self.form.lock().is_some()
    }

    /// Opens the form seeded from the loaded profile.
    pub fn start_editing(&self) -> ProfileForm {
        let form = ProfileForm::from_profile(&self.profile.lock());
        *self.form.lock() = Some(form.clone());
        form
    }

    /// Replaces the whole form, opening it if needed.
    pub fn set_form(&self, form: ProfileForm) {
        *self.form.lock() = Some(form);
    }

    /// Changes fields on the open form. `false` when not editing.
    pub fn edit(&self, change: impl FnOnce(&mut ProfileForm)) -> bool {
        match self.form.lock().as_mut() {
            Some(form) => {
                change(form);
                true
            }
            None => false,
        }
    }

    /// Drops unsaved changes.
    pub fn cancel(&self) {
        self.form.lock().take();
    }

    pub async fn save(&self) -> Outcome {
        self.try_save().await.err().unwrap_or(Outcome::Applied)
    }

    async fn try_save(&self) -> Result<(), Outcome> {
        self.scope.ready()?;
        let form = self
            .form
            .lock()
            .clone()
            .ok_or(Outcome::Refused("profile is not being edited"))?;
        let (id, role) = {
            let profile = self.profile.lock();
            (profile.id, profile.role())
        };

        let _guard = self.in_flight.begin(id)?;
        let result = mutations::update_profile(self.ctx.backend(), id, role, &form).await;
        self.scope.settle("profile update", result)?;

        form.apply_to(&mut self.profile.lock());
        self.form.lock().take();
        Ok(())
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        let profile = self.profile();
        ProfileSnapshot {
            display_name: profile.display_name(self.email.as_deref()),
            email: self.email.clone(),
            role: profile.role(),
            editing: self.form.lock().clone(),
            profile,
        }
    }
}
