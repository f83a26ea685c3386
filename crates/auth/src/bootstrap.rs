use crate::password_reset::PasswordResetManager;
use crate::receivers::{
    CheckPasswordOnLogin, CreateSessionOnLogin, DeleteSessionOnLogout, PurgeSessionStore,
};
use crate::resolvers::Resolvers;
use crate::session::SessionManager;
use crate::signals::{LoginObserver, LogoutObserver, SessionDeletedObserver, Signals};
use safety_cache::SessionStore;
use safety_database::{
    Database, PasswordResetRepository, PasswordResetStore, SessionRecordStore, SessionRepository,
};
use std::sync::Arc;

/// The wired-up managers and signals.
///
/// On login the session is recorded first and the password checked second.
/// On logout the session record is deleted, and every deleted record purges
/// its entry from the external session store.
#[derive(Clone)]
pub struct Safety {
    pub signals: Signals,
    pub sessions: SessionManager,
    pub password_resets: PasswordResetManager,
}

impl Safety {
    pub fn new(
        session_records: Arc<dyn SessionRecordStore>,
        password_resets: Arc<dyn PasswordResetStore>,
        session_store: Arc<dyn SessionStore>,
        resolvers: Resolvers,
    ) -> Self {
        Self::builder(session_records, password_resets, session_store)
            .resolvers(resolvers)
            .build()
    }

    /// Postgres-backed records.
    pub fn postgres(db: &Database, session_store: Arc<dyn SessionStore>, resolvers: Resolvers) -> Self {
        Self::new(
            Arc::new(SessionRepository::new(db.pool().clone())),
            Arc::new(PasswordResetRepository::new(db.pool().clone())),
            session_store,
            resolvers,
        )
    }

    pub fn builder(
        session_records: Arc<dyn SessionRecordStore>,
        password_resets: Arc<dyn PasswordResetStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> SafetyBuilder {
        SafetyBuilder {
            session_records,
            password_resets,
            session_store,
            resolvers: Resolvers::default(),
            login: Vec::new(),
            logout: Vec::new(),
            session_deleted: Vec::new(),
        }
    }
}

/// Extra observers run after the built-in ones.
pub struct SafetyBuilder {
    session_records: Arc<dyn SessionRecordStore>,
    password_resets: Arc<dyn PasswordResetStore>,
    session_store: Arc<dyn SessionStore>,
    resolvers: Resolvers,
    login: Vec<Arc<dyn LoginObserver>>,
    logout: Vec<Arc<dyn LogoutObserver>>,
    session_deleted: Vec<Arc<dyn SessionDeletedObserver>>,
}

impl SafetyBuilder {
    pub fn resolvers(mut self, resolvers: Resolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn on_login(mut self, observer: Arc<dyn LoginObserver>) -> Self {
        self.login.push(observer);
        self
    }

    pub fn on_logout(mut self, observer: Arc<dyn LogoutObserver>) -> Self {
        self.logout.push(observer);
        self
    }

    pub fn on_session_deleted(mut self, observer: Arc<dyn SessionDeletedObserver>) -> Self {
        self.session_deleted.push(observer);
        self
    }

    pub fn build(self) -> Safety {
        let mut sessions = SessionManager::new(self.session_records, self.resolvers)
            .with_deletion_observer(Arc::new(PurgeSessionStore::new(self.session_store)));
        for observer in self.session_deleted {
            sessions = sessions.with_deletion_observer(observer);
        }

        let password_resets = PasswordResetManager::new(self.password_resets);

        let mut signals = Signals::new();
        signals
            .connect_login(Arc::new(CreateSessionOnLogin::new(sessions.clone())))
            .connect_login(Arc::new(CheckPasswordOnLogin::new(password_resets.clone())))
            .connect_logout(Arc::new(DeleteSessionOnLogout::new(sessions.clone())));
        for observer in self.login {
            signals.connect_login(observer);
        }
        for observer in self.logout {
            signals.connect_logout(observer);
        }

        tracing::debug!("Safety signals connected");

        Safety {
            signals,
            sessions,
            password_resets,
        }
    }
}
