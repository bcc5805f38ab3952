//! Command execution
//!
//! Each command hydrates the route gate from the stored session first, the
//! same way the web client does on load, then acts as the signed-in user.
//! Commands return the text to print; nothing here writes to stdout.

use crate::render;
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use dkn_access::gate::LOGIN_PATH;
use dkn_access::{
    has_role, Confidentiality, DocumentAccess, DocumentStatus, EntityId, Location, NavKey, Navigation, Role,
    RouteGate, RouteOutcome, User, View,
};
use dkn_client::auth::{self, Registration};
use dkn_client::forms::{AiJobForm, ExpertiseForm, PolicyRuleForm, Rejection, UpdateForm, UploadForm};
use dkn_client::workflows::{self, ValidationQueue};
use dkn_client::{
    hydrate, sync_gate, ApiClient, ApiError, ClientConfig, ConfigLoader, Credentials,
    DashboardLoader, DocumentDetail, FileSessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const NOT_SIGNED_IN: &str = "Not signed in. Run `dkn login` first.";

/// Reported when the server ended the session mid-command
pub const SESSION_EXPIRED: &str = "Session expired. Run `dkn login` again.";

/// Follow at most this many in-app redirects
const MAX_REDIRECTS: usize = 3;

fn rejected(rejection: Rejection) -> anyhow::Error {
    anyhow!("{rejection}")
}

fn api_failed(err: ApiError, what: &str) -> anyhow::Error {
    anyhow!("Unable to load {what}: {}", err.user_message("request failed"))
}

fn text(args: &ArgMatches, name: &str) -> Option<String> {
    args.get_one::<String>(name).cloned()
}

fn ids(args: &ArgMatches, name: &str) -> Vec<EntityId> {
    args.get_many::<String>(name)
        .map(|values| values.map(|v| parse_id(v)).collect())
        .unwrap_or_default()
}

/// Numeric ids stay numeric on the wire
#[must_use]
pub fn parse_id(raw: &str) -> EntityId {
    raw.parse::<i64>()
        .map_or_else(|_| EntityId::from(raw), EntityId::from)
}

fn confidentiality(raw: &str) -> Result<Confidentiality> {
    Confidentiality::parse(raw).ok_or_else(|| {
        let levels: Vec<&str> = Confidentiality::ALL.iter().map(Confidentiality::as_str).collect();
        anyhow!("Unknown confidentiality {raw:?}; expected one of {}", levels.join(", "))
    })
}

/// Resolve configuration from the file, the environment and global flags
///
/// # Errors
/// - Config file or environment errors, or an invalid origin
pub fn load_config(matches: &ArgMatches) -> Result<ClientConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("loading configuration")?;

    if let Some(url) = text(matches, "api-url") {
        config = config.with_api_url(url);
    }
    if let Some(dir) = matches.get_one::<PathBuf>("session-dir") {
        config = config.with_session_dir(dir);
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout_secs(*secs);
    }
    config.validate()?;
    debug!(origin = config.api_origin(), "configuration resolved");
    Ok(config)
}

/// A client session for one command
#[derive(Debug)]
pub struct App {
    client: ApiClient,
    gate: RouteGate,
    hydrated: bool,
}

impl App {
    /// Wrap a client; the gate starts hydrating
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            gate: RouteGate::new(),
            hydrated: false,
        }
    }

    /// Connect with the file session store; a 401 signs out
    ///
    /// # Errors
    /// - The HTTP client cannot be built
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let session = Arc::new(FileSessionStore::open(config.session_dir()));
        let client = ApiClient::from_config(config, session)?.logout_on_unauthorized();
        Ok(Self::new(client))
    }

    /// Underlying client
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Route gate
    #[must_use]
    pub fn gate(&self) -> &RouteGate {
        &self.gate
    }

    async fn hydrate(&mut self) -> Result<()> {
        if self.hydrated {
            sync_gate(&self.client, &mut self.gate);
        } else {
            hydrate(&self.client, &mut self.gate).await?;
            self.hydrated = true;
        }
        Ok(())
    }

    async fn signed_in(&mut self) -> Result<User> {
        self.hydrate().await?;
        self.gate
            .current_user()
            .cloned()
            .ok_or_else(|| anyhow!(NOT_SIGNED_IN))
    }

    /// Run the selected subcommand and return its output.
    ///
    /// A 401 during the command signs the gate out as well as the store.
    ///
    /// # Errors
    /// - Any rejected action, failed load, or missing sign-in
    pub async fn execute(&mut self, matches: &ArgMatches) -> Result<String> {
        let outcome = self.dispatch(matches).await;
        if !sync_gate(&self.client, &mut self.gate) {
            return outcome;
        }
        match outcome {
            Ok(output) => Ok(format!("{output}\nnote: {SESSION_EXPIRED}")),
            Err(err) => Err(err.context(SESSION_EXPIRED)),
        }
    }

    async fn dispatch(&mut self, matches: &ArgMatches) -> Result<String> {
        match matches.subcommand() {
            Some(("login", args)) => self.login(args).await,
            Some(("register", args)) => self.register(args).await,
            Some(("logout", _)) => Ok(self.logout()),
            Some(("whoami", _)) => self.whoami().await,
            Some(("roles", _)) => Ok(render::roles(&auth::registration_roles(&self.client).await)),
            Some(("nav", _)) => {
                let user = self.signed_in().await?;
                Ok(render::navigation(&Navigation::for_user(Some(&user)), None))
            }
            Some(("open", args)) => self.open(args).await,
            Some(("view", args)) => self.view(text(args, "key").as_deref()).await,
            Some(("dashboard", args)) => self.dashboard(args.get_flag("all-projects")).await,
            Some(("doc", args)) => self.doc(args).await,
            Some(("upload", args)) => self.upload(args).await,
            Some(("tag", args)) => match args.subcommand() {
                Some(("create", args)) => self.create_tag(args).await,
                _ => bail!("expected `dkn tag create <name>`"),
            },
            Some(("expertise", args)) => match args.subcommand() {
                Some(("set", args)) => self.set_expertise(args).await,
                _ => bail!("expected `dkn expertise set`"),
            },
            Some((other, _)) => bail!("unknown command `{other}`"),
            None => bail!("no command given"),
        }
    }

    async fn login(&mut self, args: &ArgMatches) -> Result<String> {
        self.hydrate().await?;
        let credentials = Credentials::new(
            text(args, "email").unwrap_or_default(),
            text(args, "password").unwrap_or_default(),
        );
        let signed_in = auth::login(&self.client, &mut self.gate, &credentials)
            .await
            .map_err(rejected)?;
        Ok(format!(
            "Signed in as {}\nnext: {}",
            render::user(&signed_in.user),
            signed_in.destination
        ))
    }

    async fn register(&mut self, args: &ArgMatches) -> Result<String> {
        self.hydrate().await?;
        let choices = auth::registration_roles(&self.client).await;
        let registration = Registration {
            name: text(args, "name").unwrap_or_default(),
            email: text(args, "email").unwrap_or_default(),
            password: text(args, "password").unwrap_or_default(),
            role: text(args, "role"),
        };
        let signed_in = auth::register(&self.client, &mut self.gate, &choices, &registration)
            .await
            .map_err(rejected)?;

        let mut out = Vec::new();
        if let Some(notice) = &choices.notice {
            out.push(render::notice(notice));
        }
        out.push(format!(
            "Registered and signed in as {}\nnext: {}",
            render::user(&signed_in.user),
            signed_in.destination
        ));
        Ok(out.join("\n"))
    }

    fn logout(&mut self) -> String {
        let next = auth::logout(&self.client, &mut self.gate);
        format!("Signed out\nnext: {next}")
    }

    async fn whoami(&mut self) -> Result<String> {
        self.hydrate().await?;
        Ok(self
            .gate
            .current_user()
            .map_or_else(|| "Not signed in".to_string(), render::user))
    }

    async fn open(&mut self, args: &ArgMatches) -> Result<String> {
        self.hydrate().await?;
        let path = text(args, "path").unwrap_or_default();
        let mut location = Location::parse(&path);
        if let Some(from) = text(args, "from") {
            location = location.with_from(from);
        }

        Ok(match self.gate.resolve(&location) {
            RouteOutcome::Loading => "loading".to_string(),
            RouteOutcome::Render(View::Login) => "render: login".to_string(),
            RouteOutcome::Render(View::Dashboard(key)) => {
                format!("render: dashboard / {} ({})", key.label(), key.path())
            }
            RouteOutcome::Render(View::Document { id, back_to }) => {
                format!("render: document {id} (back to {back_to})")
            }
            RouteOutcome::Redirect { to, from: Some(from) } => {
                format!("redirect: {to} (return to {from} after sign-in)")
            }
            RouteOutcome::Redirect { to, from: None } => format!("redirect: {to}"),
        })
    }

    async fn view(&mut self, key: Option<&str>) -> Result<String> {
        self.hydrate().await?;
        let requested = key.map_or_else(|| "/dashboard".to_string(), |k| format!("/dashboard/{k}"));
        let mut location = Location::parse(&requested);
        let mut notes = Vec::new();

        for _ in 0..=MAX_REDIRECTS {
            match self.gate.resolve(&location) {
                RouteOutcome::Render(View::Dashboard(active)) => {
                    let body = self.render_view(active).await?;
                    notes.push(body);
                    return Ok(notes.join("\n"));
                }
                RouteOutcome::Redirect { to, .. } if to == LOGIN_PATH => bail!(NOT_SIGNED_IN),
                RouteOutcome::Redirect { to, .. } => {
                    notes.push(format!("note: {requested} is not available, showing {to}"));
                    location = Location::parse(&to);
                }
                RouteOutcome::Render(View::Login) | RouteOutcome::Loading => bail!(NOT_SIGNED_IN),
                RouteOutcome::Render(View::Document { .. }) => break,
            }
        }
        bail!("could not resolve {requested}")
    }

    async fn render_view(&self, key: NavKey) -> Result<String> {
        let client = &self.client;
        Ok(match key {
            NavKey::Knowledge => render::documents(
                key.label(),
                &client.documents().await.map_err(|e| api_failed(e, "documents"))?,
            ),
            NavKey::MyDocs => render::documents(
                key.label(),
                &client.my_documents().await.map_err(|e| api_failed(e, "your documents"))?,
            ),
            NavKey::Projects => render::projects(
                &client.projects(true).await.map_err(|e| api_failed(e, "projects"))?,
            ),
            NavKey::Metadata => {
                let (workspaces, tags) = tokio::join!(client.workspaces(), client.tags());
                render::metadata(
                    &workspaces.map_err(|e| api_failed(e, "workspaces"))?,
                    &tags.map_err(|e| api_failed(e, "tags"))?,
                )
            }
            NavKey::Constraints => {
                let (offices, constraints) =
                    tokio::join!(client.offices(), client.constraints());
                render::constraints(
                    &offices.map_err(|e| api_failed(e, "offices"))?,
                    &constraints.map_err(|e| api_failed(e, "regulatory constraints"))?,
                )
            }
            NavKey::Upload => {
                let levels: Vec<&str> =
                    Confidentiality::ALL.iter().map(Confidentiality::as_str).collect();
                format!(
                    "Upload\n  dkn upload --title <title> [--description <text>] \
                     [--confidentiality {}] [--project <id>] [--workspace <id>] [--tag <id>]...",
                    levels.join("|")
                )
            }
            NavKey::Validation => {
                let queue = ValidationQueue::load(client).await.map_err(rejected)?;
                render::documents(key.label(), queue.items())
            }
            NavKey::Audit => render::audit_logs(
                &workflows::load_audit_logs(client).await.map_err(rejected)?,
            ),
            NavKey::Expertise => render::expertise(
                client
                    .expertise_profile()
                    .await
                    .map_err(|e| api_failed(e, "expertise profile"))?
                    .as_ref(),
            ),
            NavKey::Gamification => {
                let (score, board) = tokio::join!(client.gamification(), client.leaderboard());
                render::gamification(
                    score.map_err(|e| api_failed(e, "points"))?.as_ref(),
                    &board.map_err(|e| api_failed(e, "leaderboard"))?,
                )
            }
            NavKey::Recommendations => render::recommendations(
                &workflows::load_recommendations(client).await.map_err(rejected)?,
            ),
            NavKey::Admin => render::directory(
                &workflows::load_directory(client).await.map_err(rejected)?,
            ),
        })
    }

    async fn dashboard(&mut self, all_projects: bool) -> Result<String> {
        self.signed_in().await?;
        let mut loader = DashboardLoader::new(self.client.clone());
        if all_projects {
            loader = loader.with_inactive_projects();
        }
        loader.start();
        Ok(render::dashboard(loader.finish().await))
    }

    async fn detail(&mut self, id: &EntityId) -> Result<(DocumentDetail, DocumentAccess)> {
        self.hydrate().await?;
        let location = Location::parse(&format!("/documents/{id}"));
        if let RouteOutcome::Redirect { .. } = self.gate.resolve(&location) {
            bail!(NOT_SIGNED_IN);
        }
        let detail = DocumentDetail::load(&self.client, id).await.map_err(rejected)?;
        let access = detail.access(self.gate.current_user());
        Ok((detail, access))
    }

    async fn doc(&mut self, args: &ArgMatches) -> Result<String> {
        let Some((action, args)) = args.subcommand() else {
            bail!("expected a document action");
        };
        let id = parse_id(&text(args, "id").unwrap_or_default());

        match action {
            "show" => {
                let (detail, access) = self.detail(&id).await?;
                Ok(render::detail(&detail, &access))
            }
            "update" => {
                let (detail, access) = self.detail(&id).await?;
                let mut form = UpdateForm::from_document(&detail.document);
                if let Some(title) = text(args, "title") {
                    form.title = title;
                }
                if let Some(description) = text(args, "description") {
                    form.description = description;
                }
                if let Some(raw) = text(args, "confidentiality") {
                    form.confidentiality = Some(confidentiality(&raw)?);
                }
                if let Some(raw) = text(args, "status") {
                    form.status = Some(DocumentStatus::parse(&raw));
                }
                let tags = ids(args, "tag");
                if !tags.is_empty() {
                    form.tag_ids = tags;
                }
                let notice = workflows::update_document(&self.client, &access, &id, &form)
                    .await
                    .map_err(rejected)?;
                Ok(render::notice(&notice))
            }
            "delete" => {
                self.signed_in().await?;
                let notice = workflows::delete_document(&self.client, &id)
                    .await
                    .map_err(rejected)?;
                Ok(render::notice(&notice))
            }
            "validate" => self.validate(&id).await,
            "add-rule" | "add-job" => {
                let (_, access) = self.detail(&id).await?;
                if !access.can_manage_add_ons() {
                    bail!("Policy rules and AI jobs are managed by champions, governance and admins.");
                }
                let outcome = if action == "add-rule" {
                    let form = PolicyRuleForm {
                        rule_type: text(args, "type").unwrap_or_default(),
                        description: text(args, "description").unwrap_or_default(),
                    };
                    workflows::add_policy_rule(&self.client, &id, &form).await
                } else {
                    let form = AiJobForm {
                        job_type: text(args, "type").unwrap_or_default(),
                        status: text(args, "status").unwrap_or_default(),
                    };
                    workflows::add_ai_job(&self.client, &id, &form).await
                };
                Ok(render::notice(&outcome.map_err(rejected)?))
            }
            other => bail!("unknown document action `{other}`"),
        }
    }

    async fn validate(&mut self, id: &EntityId) -> Result<String> {
        let user = self.signed_in().await?;
        if !has_role(&Role::GOVERNANCE_TIER, Some(&user)) {
            bail!("Only champions, governance and admins can validate documents.");
        }

        let mut queue = ValidationQueue::load(&self.client).await.map_err(rejected)?;
        let notice = queue.validate(&self.client, id).await.map_err(rejected)?;

        let (documents, mine) =
            tokio::join!(self.client.documents(), self.client.my_documents());
        let mut out = vec![render::notice(&notice)];
        out.push(format!("{} still pending", queue.items().len()));
        if let (Ok(documents), Ok(mine)) = (documents, mine) {
            out.push(format!(
                "knowledge base: {} documents, yours: {}",
                documents.len(),
                mine.len()
            ));
        }
        Ok(out.join("\n"))
    }

    async fn upload(&mut self, args: &ArgMatches) -> Result<String> {
        self.signed_in().await?;
        let form = UploadForm {
            title: text(args, "title").unwrap_or_default(),
            description: text(args, "description").unwrap_or_default(),
            confidentiality: text(args, "confidentiality")
                .map(|raw| confidentiality(&raw))
                .transpose()?,
            project_id: text(args, "project").map(|raw| parse_id(&raw)),
            workspace_id: text(args, "workspace").map(|raw| parse_id(&raw)),
            tag_ids: ids(args, "tag"),
        };
        let notice = workflows::upload_document(&self.client, &form)
            .await
            .map_err(rejected)?;
        Ok(render::notice(&notice))
    }

    async fn create_tag(&mut self, args: &ArgMatches) -> Result<String> {
        let user = self.signed_in().await?;
        if !has_role(&[Role::Admin], Some(&user)) {
            bail!("Only admins can create tags.");
        }
        let name = text(args, "name").unwrap_or_default();
        match workflows::create_tag(&self.client, &name).await.map_err(rejected)? {
            Some(notice) => Ok(render::notice(&notice)),
            None => bail!("Tag name is required."),
        }
    }

    async fn set_expertise(&mut self, args: &ArgMatches) -> Result<String> {
        self.signed_in().await?;
        let current = self
            .client
            .expertise_profile()
            .await
            .map_err(|e| api_failed(e, "expertise profile"))?;
        let mut form = ExpertiseForm::from_profile(current.as_ref());
        if let Some(skills) = text(args, "skills") {
            form.skills = skills;
        }
        if let Some(level) = text(args, "level") {
            form.experience_level = level;
        }
        let notice = workflows::save_expertise(&self.client, &form)
            .await
            .map_err(rejected)?;
        Ok(render::notice(&notice))
    }
}

/// Load configuration, connect, and run the selected command
///
/// # Errors
/// - Configuration, connection, or command failure
pub async fn run(matches: &ArgMatches) -> Result<String> {
    let config = load_config(matches)?;
    let mut app = App::connect(&config)?;
    app.execute(matches).await
}
