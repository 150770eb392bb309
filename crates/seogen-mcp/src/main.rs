use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use seogen_core::{
    catalog, FileStore, KvStore, PolicyPatch, PolicyStore, SeoUpdate, UpdateRegistry, VersionData,
    VersionStore,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const INSTRUCTIONS: &str = "\
SEO generator knowledge base for an OpenCart catalog (Russian market, Yandex first).\n\
\n\
## Concepts\n\
- Policy: operator thresholds. innovationLevel (0-100) weights trend and experimental updates; \
autoApplyClassic / requireApprovalForTrends / requireApprovalForExperimental decide which \
unapproved updates may proceed without a human.\n\
- Update: a suggested rule change with a category (classic, trend, experimental) and an impact \
(critical, high, medium, low). Lifecycle: proposed -> approved -> applied to prompts. \
An update can only be applied after it was approved.\n\
- Enhanced prompt: a base template with the approved updates' instructions appended as a \
numbered list, most severe first. Low-weight trend/experimental lines are marked [Опционально].\n\
\n\
## Workflow\n\
1. `get_policy` and `list_updates` to see the current state.\n\
2. `applicable_updates` lists what may be processed without manual review.\n\
3. `approve_update`, then `apply_update`, for each update the operator accepts.\n\
4. `enhance_prompt` to preview a template with the approved guidance.\n\
5. `save_version` / `export_version` to snapshot dashboard state.";

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateIdRequest {
    /// ID of the update, e.g. "upd_2"
    id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveUpdateRequest {
    /// Full update record. Replaces the stored record with the same id, or is added at the front.
    update: SeoUpdate,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct EnhancePromptRequest {
    /// ID of a catalog prompt ("h1", "description", "product_desc"). Ignored when template is given.
    prompt_id: Option<String>,
    /// Raw template text to enhance instead of a catalog prompt
    template: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GenerateContentRequest {
    /// Product, category or article topic, e.g. "Кофемашина"
    topic: String,
    /// Field IDs to generate, e.g. ["h1", "title", "description"]. See list_field_types.
    fields: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct VersionIdRequest {
    /// ID of the version, e.g. "v_1760000000000"
    id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveVersionRequest {
    /// Display name of the snapshot
    name: String,
    /// Free-text description
    description: Option<String>,
    /// Optional commit reference to attach
    commit: Option<String>,
    /// Dashboard state as a JSON object: {activeTab, generationTopic, brandDescription, productUrl, extractedData, generationResults, selectedFields, trafficSettings}. Missing fields default.
    data: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ImportVersionRequest {
    /// A document produced by export_version. Must contain id, name and data.
    document: String,
}

// --- Server ---

#[derive(Clone)]
pub struct SeoGenServer {
    policy: PolicyStore,
    updates: UpdateRegistry,
    versions: VersionStore,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SeoGenServer {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            policy: PolicyStore::new(Arc::clone(&store)),
            updates: UpdateRegistry::new(Arc::clone(&store)),
            versions: VersionStore::new(store),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get the current SEO policy (innovation level, auto-apply and approval flags, weights)")]
    fn get_policy(&self) -> Result<CallToolResult, McpError> {
        match self.policy.get_policy() {
            Ok(policy) => json_result(&policy),
            Err(e) => error_result(format!("Failed to read policy: {}", e)),
        }
    }

    #[tool(
        description = "Change one or more policy fields. Omitted fields keep their value. Returns the merged policy."
    )]
    fn update_policy(
        &self,
        Parameters(patch): Parameters<PolicyPatch>,
    ) -> Result<CallToolResult, McpError> {
        match self.policy.update_policy(&patch) {
            Ok(policy) => json_result(&policy),
            Err(e) => error_result(format!("Failed to update policy: {}", e)),
        }
    }

    #[tool(description = "List all SEO updates with their approval and applied flags")]
    fn list_updates(&self) -> Result<CallToolResult, McpError> {
        match self.updates.get_updates() {
            Ok(updates) if updates.is_empty() => {
                Ok(CallToolResult::success(vec![Content::text("No updates stored.")]))
            }
            Ok(updates) => json_result(&updates),
            Err(e) => error_result(format!("Failed to read updates: {}", e)),
        }
    }

    #[tool(description = "Approve an update so it contributes to enhanced prompts")]
    fn approve_update(
        &self,
        Parameters(req): Parameters<UpdateIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.updates.approve_update(&req.id) {
            Ok(update) => json_result(&update),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Mark an approved update as applied to prompts. Fails if the update is not approved yet.")]
    fn apply_update(
        &self,
        Parameters(req): Parameters<UpdateIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.updates.apply_update_to_prompts(&req.id) {
            Ok(update) => json_result(&update),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Add or replace an update record")]
    fn save_update(
        &self,
        Parameters(req): Parameters<SaveUpdateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = req.update.id.clone();
        match self.updates.save_update(req.update) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Saved update '{}'",
                id
            ))])),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(
        description = "List updates eligible for processing without manual review under the current policy: approved-but-unapplied ones, plus unapproved ones whose category the policy lets through."
    )]
    fn applicable_updates(&self) -> Result<CallToolResult, McpError> {
        let applicable = self
            .policy
            .get_policy()
            .and_then(|policy| self.updates.get_applicable_updates(&policy));
        match applicable {
            Ok(updates) => json_result(&updates),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(
        description = "Preview a prompt template with approved update guidance appended, weighted by the current policy"
    )]
    fn enhance_prompt(
        &self,
        Parameters(req): Parameters<EnhancePromptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let base = match resolve_template(req.template, req.prompt_id.as_deref()) {
            Ok(base) => base,
            Err(msg) => return error_result(msg),
        };
        let inputs = self
            .policy
            .get_policy()
            .and_then(|policy| Ok((policy, self.updates.get_updates()?)));
        match inputs {
            Ok((policy, updates)) => Ok(CallToolResult::success(vec![Content::text(
                seogen_prompt::generate_enhanced_prompt(&base, &updates, &policy),
            )])),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "List the catalog prompt templates with their variables and AI balance")]
    fn list_prompts(&self) -> Result<CallToolResult, McpError> {
        json_result(&catalog::PROMPTS)
    }

    #[tool(description = "List the OpenCart fields copy can be generated for, with character limits")]
    fn list_field_types(&self) -> Result<CallToolResult, McpError> {
        json_result(&catalog::FIELD_TYPES)
    }

    #[tool(description = "List the knowledge sources the actualization feed follows")]
    fn list_sources(&self) -> Result<CallToolResult, McpError> {
        json_result(&catalog::KNOWLEDGE_SOURCES)
    }

    #[tool(description = "Generate template copy for the selected fields. Returns {fieldId: text}.")]
    fn generate_content(
        &self,
        Parameters(req): Parameters<GenerateContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        match seogen_prompt::generate(&req.topic, &req.fields) {
            Ok(results) => json_result(&results),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "List saved dashboard versions and the current version id")]
    fn list_versions(&self) -> Result<CallToolResult, McpError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Listing {
            current_version_id: Option<String>,
            versions: Vec<seogen_core::Version>,
        }
        let listing = self.versions.list_versions().and_then(|versions| {
            Ok(Listing {
                current_version_id: self.versions.current_version_id()?,
                versions,
            })
        });
        match listing {
            Ok(listing) => json_result(&listing),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Snapshot dashboard state as a new version and make it current")]
    fn save_version(
        &self,
        Parameters(req): Parameters<SaveVersionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let data: VersionData = match serde_json::from_str(&req.data) {
            Ok(d) => d,
            Err(e) => return error_result(format!("Invalid version data: {}", e)),
        };
        let description = req.description.unwrap_or_default();
        match self
            .versions
            .save_version(&req.name, &description, data, req.commit)
        {
            Ok(version) => json_result(&version),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Get one saved version")]
    fn get_version(
        &self,
        Parameters(req): Parameters<VersionIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.versions.get_version(&req.id) {
            Ok(version) => json_result(&version),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Make a saved version the current one")]
    fn set_current_version(
        &self,
        Parameters(req): Parameters<VersionIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.versions.set_current_version(&req.id) {
            Ok(version) => json_result(&version),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Delete a saved version")]
    fn delete_version(
        &self,
        Parameters(req): Parameters<VersionIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.versions.delete_version(&req.id) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Deleted version '{}'",
                req.id
            ))])),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Export a version as a JSON document suitable for import_version")]
    fn export_version(
        &self,
        Parameters(req): Parameters<VersionIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.versions.export_version(&req.id) {
            Ok(doc) => Ok(CallToolResult::success(vec![Content::text(doc)])),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Import a version document. The version gets a fresh id and does not become current.")]
    fn import_version(
        &self,
        Parameters(req): Parameters<ImportVersionRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.versions.import_version(&req.document) {
            Ok(version) => json_result(&version),
            Err(e) => error_result(e.to_string()),
        }
    }
}

#[tool_handler]
impl ServerHandler for SeoGenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => error_result(format!("Serialization error: {}", e)),
    }
}

fn error_result(message: impl Into<String>) -> Result<CallToolResult, McpError> {
    let message = message.into();
    tracing::warn!("{}", message);
    Ok(CallToolResult::error(vec![Content::text(message)]))
}

/// An explicit template wins over a catalog prompt id.
fn resolve_template(template: Option<String>, prompt_id: Option<&str>) -> Result<String, String> {
    if let Some(template) = template {
        return Ok(template);
    }
    match prompt_id {
        Some(id) => catalog::find_prompt(id)
            .map(|p| p.template.to_string())
            .ok_or_else(|| format!("Unknown prompt '{}'. Use list_prompts to see available ids.", id)),
        None => Err("Provide either template or prompt_id".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let file_store = FileStore::open_default();
    tracing::info!(dir = %file_store.dir().display(), "opening knowledge base");
    let store: Arc<dyn KvStore> = Arc::new(file_store);
    seogen_core::initialize(&store, seogen_core::now_millis())?;

    let service = SeoGenServer::new(store)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}
