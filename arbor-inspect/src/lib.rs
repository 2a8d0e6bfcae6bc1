//! Site fixtures and the queries the inspector can answer about them.
//!
//! A fixture is a JSON document holding a schema snapshot, catalog
//! records, stored nodes and permission grants. [`Site::load`] wires it
//! into in-memory stores; [`Query::run`] answers one question through the
//! back-office components and returns the answer as JSON.

use anyhow::{Context, Result, anyhow};
use arbor_backoffice::{
    BackofficeConfig, EntityResolver, MoveCopyValidator, MoveOrCopy, PageRequest, PermissionGate,
    RequestContext, Services, TreeOperations, TreeOutcome,
};
use arbor_model::ContentNode;
use arbor_storage::{
    CatalogData, CatalogService, ContentService, MemoryCatalog, MemoryContentService,
    MemorySchemaService, NotificationBus, SchemaSnapshot, SqlitePermissionStore,
};
use arbor_types::{EntityKind, Identifier, NodeId};
use clap::Subcommand;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Letters granted to a user, on one node or as their default.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionGrant {
    pub user_id: i32,
    /// `None` sets the user's default letters.
    #[serde(default)]
    pub node_id: Option<NodeId>,
    pub letters: String,
}

/// The on-disk fixture format.
#[derive(Debug, Default, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pub schema: SchemaSnapshot,
    #[serde(default)]
    pub catalog: CatalogData,
    #[serde(default)]
    pub nodes: Vec<ContentNode>,
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

impl SiteFixture {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Fixture is not valid JSON")
    }
}

/// A fixture loaded into live stores.
pub struct Site {
    pub services: Services,
}

impl Site {
    /// Reads and wires the fixture at `path`.
    pub fn load(path: &Path, config: BackofficeConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {path:?}"))?;
        let site = Self::from_fixture(SiteFixture::from_json(&text)?, config)?;
        info!("Loaded fixture from {:?}", path);
        Ok(site)
    }

    pub fn from_fixture(fixture: SiteFixture, config: BackofficeConfig) -> Result<Self> {
        let schema = Arc::new(MemorySchemaService::from_snapshot(fixture.schema)?);
        let bus = Arc::new(NotificationBus::new());
        let content = Arc::new(
            MemoryContentService::new(schema.clone(), bus)
                .with_recycle_bins(config.recycle_bin.content_id, config.recycle_bin.media_id),
        );
        let node_count = fixture.nodes.len();
        for node in fixture.nodes {
            let id = node.id;
            content
                .insert(node)
                .with_context(|| format!("Node {id} in the fixture is inconsistent"))?;
        }

        let permissions = Arc::new(SqlitePermissionStore::open_in_memory()?);
        for grant in &fixture.permissions {
            match grant.node_id {
                Some(node_id) => {
                    permissions.set_permissions(grant.user_id, node_id, &grant.letters)?
                }
                None => permissions.set_default_permissions(grant.user_id, &grant.letters)?,
            }
        }
        debug!(
            "Fixture holds {} nodes and {} permission grants",
            node_count,
            fixture.permissions.len()
        );

        let catalog = Arc::new(MemoryCatalog::new(fixture.catalog));
        let services = Services::new(content, schema, catalog, permissions).with_config(config);
        Ok(Self { services })
    }

    /// A request context acting as catalog user `user_id`.
    pub fn context_for(&self, user_id: i32) -> Result<RequestContext> {
        let user = self
            .services
            .catalog
            .user(user_id)?
            .ok_or_else(|| anyhow!("User {user_id} is not in the fixture"))?;
        Ok(RequestContext::new(user))
    }
}

fn parse_kind(s: &str) -> std::result::Result<EntityKind, String> {
    EntityKind::from_udi_type(s).ok_or_else(|| {
        let known: Vec<&str> = EntityKind::ALL.iter().map(EntityKind::udi_type).collect();
        format!("unknown entity kind '{s}', expected one of: {}", known.join(", "))
    })
}

fn parse_identifier(s: &str) -> std::result::Result<Identifier, String> {
    s.parse::<Identifier>().map_err(|e| e.to_string())
}

/// One question about the site.
#[derive(Debug, Clone, Subcommand)]
pub enum Query {
    /// Look up one entity by id, key or UDI
    Get {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(value_parser = parse_identifier)]
        id: Identifier,
    },
    /// List the children of a node
    Children {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(default_value_t = -1, allow_hyphen_values = true)]
        parent: i32,
    },
    /// Page through the descendants of a node
    Descendants {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(default_value_t = -1, allow_hyphen_values = true)]
        id: i32,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        page: i64,
        #[arg(long, default_value_t = 100, allow_hyphen_values = true)]
        size: i64,
        /// Substring the names must contain
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the breadcrumb of a node as the acting user sees it
    Ancestors {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: i32,
    },
    /// List every entity of a kind
    All {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        /// Filter expression such as `Name==Home&Id>=5`
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the id chain from the root to a node
    Path {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: i32,
    },
    /// Check whether the acting user holds permission letters on a node
    Access {
        id: i32,
        #[arg(default_value = "")]
        letters: String,
    },
    /// Check whether a node could be moved or copied below a parent
    CheckMove {
        id: i32,
        #[arg(allow_hyphen_values = true)]
        parent: i32,
    },
    /// Publish a stored node and report the outcome (not written back)
    Publish { id: i32 },
}

impl Query {
    /// Answers the query on behalf of `ctx`.
    pub fn run(&self, site: &Site, ctx: &RequestContext) -> Result<Value> {
        let services = &site.services;
        let resolver = EntityResolver::new(services);
        let answer = match self {
            Self::Get { kind, id } => serde_json::to_value(resolver.get_by_id(*kind, id)?)?,
            Self::Children { kind, parent } => {
                serde_json::to_value(resolver.get_children(ctx, *kind, NodeId::new(*parent))?)?
            }
            Self::Descendants {
                kind,
                id,
                page,
                size,
                filter,
            } => {
                let mut request = PageRequest::new(*page, *size);
                if let Some(filter) = filter {
                    request = request.with_filter(filter.clone());
                }
                let page = resolver.get_paged_descendants(ctx, *kind, NodeId::new(*id), &request)?;
                serde_json::to_value(page)?
            }
            Self::Ancestors { kind, id } => {
                serde_json::to_value(resolver.get_ancestors(ctx, *kind, NodeId::new(*id), None)?)?
            }
            Self::All { kind, filter } => {
                serde_json::to_value(resolver.get_all(*kind, filter.as_deref())?)?
            }
            Self::Path { kind, id } => {
                serde_json::to_value(resolver.get_path(*kind, NodeId::new(*id))?)?
            }
            Self::Access { id, letters } => {
                let node_id = NodeId::new(*id);
                let node = services
                    .content
                    .get_by_id(node_id)?
                    .ok_or_else(|| anyhow!("Node {id} does not exist"))?;
                let gate = PermissionGate::new(
                    services.content.clone(),
                    services.permissions.clone(),
                    services.config.clone(),
                );
                let granted = gate.has_access(&ctx.user, node_id, node.object_type, letters)?;
                json!({ "id": node_id, "letters": letters, "granted": granted })
            }
            Self::CheckMove { id, parent } => {
                let validator =
                    MoveCopyValidator::new(services.content.clone(), services.schema.clone());
                let request = MoveOrCopy::new(NodeId::new(*id), NodeId::new(*parent));
                match validator.validate(&request)? {
                    Ok(node) => json!({ "allowed": true, "path": node.path }),
                    Err(rejection) => {
                        json!({ "allowed": false, "reason": rejection.message_key() })
                    }
                }
            }
            Self::Publish { id } => {
                let ops = TreeOperations::new(services);
                match ops.publish_by_id(ctx, NodeId::new(*id))? {
                    TreeOutcome::Completed(result) => json!({
                        "outcome": "completed",
                        "status": result.status,
                        "invalidProperties": result.invalid_properties,
                    }),
                    other => describe_refusal(&other),
                }
            }
        };
        Ok(answer)
    }
}

fn describe_refusal<T>(outcome: &TreeOutcome<T>) -> Value {
    match outcome {
        TreeOutcome::Completed(_) => json!({ "outcome": "completed" }),
        TreeOutcome::Forbidden => json!({ "outcome": "forbidden" }),
        TreeOutcome::Rejected(rejection) => {
            json!({ "outcome": "rejected", "reason": rejection.message_key() })
        }
        TreeOutcome::Failed(status) => json!({ "outcome": "failed", "status": status }),
    }
}
