//! Catalog management route handlers.
//!
//! Product list, create and edit forms, variant management, and
//! deactivation. Failed posts re-render their page with a message and the
//! typed values; successes redirect back with a query flag.
//!
//! Everything here except the list page sits behind the catalog permission.
//! Deactivation is the only removal offered: order lines reference product
//! rows, so rows are never deleted from the panel.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildbloom_core::{Money, ProductId, Slug, VariantId};

use crate::db::RepositoryError;
use crate::db::products::{ProductInput, ProductRepository, VariantInput};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{ClientIp, RequireAdminAuth, RequireManageCatalog};
use crate::models::CurrentAdmin;
use crate::models::catalog::{Product, ProductVariant};
use crate::routes::{CsrfForm, NavView, require_csrf};
use crate::security::sanitize;
use crate::state::AppState;

/// Longest product or variant name we store.
const MAX_NAME_LENGTH: usize = 200;

/// Longest product description we store.
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Longest SKU we store.
const MAX_SKU_LENGTH: usize = 64;

// =============================================================================
// View Types
// =============================================================================

/// Product row for the list page.
#[derive(Clone)]
pub struct ProductRowView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub price: String,
    /// Count for tracked products, "Untracked" otherwise.
    pub inventory: String,
    pub active: bool,
    pub featured: bool,
    pub low_stock: bool,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        let inventory = if product.track_inventory {
            product.inventory_quantity.to_string()
        } else {
            "Untracked".to_owned()
        };

        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            slug: product.slug.to_string(),
            price: product.price.to_string(),
            inventory,
            active: product.active,
            featured: product.featured,
            low_stock: product.is_low_stock(),
        }
    }
}

/// Variant row for the edit page table.
#[derive(Clone)]
pub struct VariantView {
    pub id: i32,
    pub name: String,
    pub sku: Option<String>,
    /// Override price, or `None` when the product price applies.
    pub price: Option<String>,
    /// Override count, or `None` when the product count applies.
    pub inventory: Option<i32>,
    pub low_stock: bool,
}

impl From<&ProductVariant> for VariantView {
    fn from(variant: &ProductVariant) -> Self {
        Self {
            id: variant.id.as_i32(),
            name: variant.name.clone(),
            sku: variant.sku.clone(),
            price: variant.price.map(|p| p.to_string()),
            inventory: variant.inventory_quantity,
            low_stock: variant.is_low_stock(),
        }
    }
}

/// Editable field state for the product form, used for both the blank
/// create form and re-renders that keep what was typed.
#[derive(Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: String,
    pub inventory_quantity: String,
    pub track_inventory: bool,
    pub active: bool,
    pub featured: bool,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.to_string(),
            description: product.description.clone(),
            // Bare number for the input field; Display renders "$9.00".
            price: product.price.amount().to_string(),
            inventory_quantity: product.inventory_quantity.to_string(),
            track_inventory: product.track_inventory,
            active: product.active,
            featured: product.featured,
        }
    }
}

impl From<&ProductForm> for ProductFormView {
    fn from(form: &ProductForm) -> Self {
        Self {
            name: form.name.clone(),
            slug: form.slug.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            inventory_quantity: form.inventory_quantity.clone(),
            track_inventory: form.track_inventory.is_some(),
            active: form.active.is_some(),
            featured: form.featured.is_some(),
        }
    }
}

// =============================================================================
// Form and Query Types
// =============================================================================

/// Product create/update form data.
///
/// Checkboxes arrive as `Some("on")` when ticked and are absent otherwise,
/// so they deserialize as options rather than bools.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub inventory_quantity: String,
    pub track_inventory: Option<String>,
    pub active: Option<String>,
    pub featured: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

/// Variant add form data.
#[derive(Debug, Deserialize)]
pub struct VariantForm {
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub inventory_quantity: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Edit page query flags set by the mutation redirects.
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub created: Option<String>,
    pub saved: Option<String>,
}

/// Validate a product form into a repository input.
///
/// Returns the message to re-render with on failure. An empty slug field is
/// filled in from the name.
fn parse_product_form(form: &ProductForm) -> Result<ProductInput, String> {
    let name = sanitize::clean_line(&form.name, MAX_NAME_LENGTH);
    if name.is_empty() {
        return Err("Please enter a product name".to_owned());
    }

    let slug = if form.slug.trim().is_empty() {
        Slug::from_name(&name)
    } else {
        Slug::parse(form.slug.trim())
    }
    .map_err(|e| e.to_string())?;

    let price = Money::parse(&form.price).map_err(|e| e.to_string())?;

    let inventory_quantity = if form.inventory_quantity.trim().is_empty() {
        0
    } else {
        form.inventory_quantity
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|q| *q >= 0)
            .ok_or("Inventory must be a non-negative whole number")?
    };

    Ok(ProductInput {
        slug,
        name,
        description: sanitize::clean_multiline(&form.description, MAX_DESCRIPTION_LENGTH),
        price,
        inventory_quantity,
        track_inventory: form.track_inventory.is_some(),
        active: form.active.is_some(),
        featured: form.featured.is_some(),
    })
}

/// Validate a variant form into a repository input.
///
/// SKU, price, and inventory are overrides; empty fields mean "inherit from
/// the product".
fn parse_variant_form(form: &VariantForm) -> Result<VariantInput, String> {
    let name = sanitize::clean_line(&form.name, MAX_NAME_LENGTH);
    if name.is_empty() {
        return Err("Please enter a variant name".to_owned());
    }

    let sku = sanitize::clean_line(&form.sku, MAX_SKU_LENGTH);
    let sku = if sku.is_empty() { None } else { Some(sku) };

    let price = if form.price.trim().is_empty() {
        None
    } else {
        Some(Money::parse(&form.price).map_err(|e| e.to_string())?)
    };

    let inventory_quantity = if form.inventory_quantity.trim().is_empty() {
        None
    } else {
        Some(
            form.inventory_quantity
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|q| *q >= 0)
                .ok_or("Inventory must be a non-negative whole number")?,
        )
    };

    let position = if form.position.trim().is_empty() {
        0
    } else {
        form.position
            .trim()
            .parse::<i32>()
            .map_err(|_| "Position must be a whole number")?
    };

    Ok(VariantInput {
        name,
        sku,
        price,
        inventory_quantity,
        position,
    })
}

// =============================================================================
// Templates
// =============================================================================

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub nav: NavView,
    pub products: Vec<ProductRowView>,
}

/// Product create form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct NewProductTemplate {
    pub nav: NavView,
    pub form: ProductFormView,
    pub error: Option<String>,
}

/// Product edit template: the form plus the variants table.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct EditProductTemplate {
    pub nav: NavView,
    pub id: i32,
    pub form: ProductFormView,
    pub variants: Vec<VariantView>,
    pub error: Option<String>,
    pub variant_error: Option<String>,
    pub created: bool,
    pub saved: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product list, inactive rows included.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<ProductsTemplate, AppError> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(ProductsTemplate {
        nav,
        products: products.iter().map(ProductRowView::from).collect(),
    })
}

/// Display the blank create form.
#[instrument(skip(session, admin))]
pub async fn new_page(
    session: Session,
    RequireManageCatalog(admin): RequireManageCatalog,
) -> Result<NewProductTemplate, AppError> {
    let nav = NavView::load(&session, &admin).await?;
    Ok(NewProductTemplate {
        nav,
        form: ProductFormView {
            // New products start sellable; untick to stage a draft.
            active: true,
            track_inventory: true,
            ..ProductFormView::default()
        },
        error: None,
    })
}

/// Create a product.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(admin): RequireManageCatalog,
    ip: ClientIp,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let input = match parse_product_form(&form) {
        Ok(input) => input,
        Err(message) => {
            return render_new_error(&session, &admin, &form, message).await;
        }
    };

    match ProductRepository::new(state.pool()).create(&input).await {
        Ok(product) => Ok(
            Redirect::to(&format!("/products/{}/edit?created=1", product.id.as_i32()))
                .into_response(),
        ),
        Err(RepositoryError::Conflict(_)) => {
            let message = format!("A product with the slug \"{}\" already exists", input.slug);
            render_new_error(&session, &admin, &form, message).await
        }
        Err(other) => Err(other.into()),
    }
}

async fn render_new_error(
    session: &Session,
    admin: &CurrentAdmin,
    form: &ProductForm,
    message: String,
) -> Result<Response, AppError> {
    let nav = NavView::load(session, admin).await?;
    Ok(NewProductTemplate {
        nav,
        form: ProductFormView::from(form),
        error: Some(message),
    }
    .into_response())
}

/// Display the edit form with the variants table.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(admin): RequireManageCatalog,
    Path(product_id): Path<ProductId>,
    Query(query): Query<EditQuery>,
) -> Result<EditProductTemplate, AppError> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
    let variants = repo.list_variants(product_id).await?;

    let nav = NavView::load(&session, &admin).await?;
    Ok(EditProductTemplate {
        nav,
        id: product_id.as_i32(),
        form: ProductFormView::from(&product),
        variants: variants.iter().map(VariantView::from).collect(),
        error: None,
        variant_error: None,
        created: query.created.is_some(),
        saved: query.saved.is_some(),
    })
}

/// Update a product.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(admin): RequireManageCatalog,
    ip: ClientIp,
    Path(product_id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let repo = ProductRepository::new(state.pool());

    let input = match parse_product_form(&form) {
        Ok(input) => input,
        Err(message) => {
            return render_edit_error(&state, &session, &admin, product_id, &form, message).await;
        }
    };

    match repo.update(product_id, &input).await {
        Ok(_) => Ok(
            Redirect::to(&format!("/products/{}/edit?saved=1", product_id.as_i32()))
                .into_response(),
        ),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("product {product_id}")))
        }
        Err(RepositoryError::Conflict(_)) => {
            let message = format!("A product with the slug \"{}\" already exists", input.slug);
            render_edit_error(&state, &session, &admin, product_id, &form, message).await
        }
        Err(other) => Err(other.into()),
    }
}

async fn render_edit_error(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    product_id: ProductId,
    form: &ProductForm,
    message: String,
) -> Result<Response, AppError> {
    let variants = ProductRepository::new(state.pool())
        .list_variants(product_id)
        .await?;

    let nav = NavView::load(session, admin).await?;
    Ok(EditProductTemplate {
        nav,
        id: product_id.as_i32(),
        form: ProductFormView::from(form),
        variants: variants.iter().map(VariantView::from).collect(),
        error: Some(message),
        variant_error: None,
        created: false,
        saved: false,
    }
    .into_response())
}

/// Add a variant to a product.
#[instrument(skip(state, session, form))]
pub async fn add_variant(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(admin): RequireManageCatalog,
    ip: ClientIp,
    Path(product_id): Path<ProductId>,
    Form(form): Form<VariantForm>,
) -> Result<Response, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    let repo = ProductRepository::new(state.pool());

    // The edit page is the re-render target, so the product must exist
    // either way.
    let product = repo
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let input = match parse_variant_form(&form) {
        Ok(input) => input,
        Err(message) => {
            return render_variant_error(&state, &session, &admin, &product, message).await;
        }
    };

    match repo.add_variant(product_id, &input).await {
        Ok(_) => Ok(
            Redirect::to(&format!("/products/{}/edit?saved=1", product_id.as_i32()))
                .into_response(),
        ),
        Err(RepositoryError::Conflict(_)) => {
            let message = "That SKU is already in use".to_owned();
            render_variant_error(&state, &session, &admin, &product, message).await
        }
        Err(other) => Err(other.into()),
    }
}

async fn render_variant_error(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    product: &Product,
    message: String,
) -> Result<Response, AppError> {
    let variants = ProductRepository::new(state.pool())
        .list_variants(product.id)
        .await?;

    let nav = NavView::load(session, admin).await?;
    Ok(EditProductTemplate {
        nav,
        id: product.id.as_i32(),
        form: ProductFormView::from(product),
        variants: variants.iter().map(VariantView::from).collect(),
        error: None,
        variant_error: Some(message),
        created: false,
        saved: false,
    }
    .into_response())
}

/// Delete a variant.
#[instrument(skip(state, session, form))]
pub async fn delete_variant(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(_admin): RequireManageCatalog,
    ip: ClientIp,
    Path((product_id, variant_id)): Path<(ProductId, VariantId)>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    match ProductRepository::new(state.pool())
        .delete_variant(variant_id, product_id)
        .await
    {
        // Already gone still lands on the state the admin asked for.
        Ok(()) | Err(RepositoryError::NotFound) => Ok(Redirect::to(&format!(
            "/products/{}/edit",
            product_id.as_i32()
        ))),
        Err(other) => Err(other.into()),
    }
}

/// Deactivate a product, hiding it from the storefront.
#[instrument(skip(state, session, form))]
pub async fn deactivate(
    State(state): State<AppState>,
    session: Session,
    RequireManageCatalog(_admin): RequireManageCatalog,
    ip: ClientIp,
    Path(product_id): Path<ProductId>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, AppError> {
    require_csrf(&state, &session, &ip, &form.csrf_token).await?;

    match ProductRepository::new(state.pool()).deactivate(product_id).await {
        Ok(()) => Ok(Redirect::to("/products")),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("product {product_id}")))
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base_form() -> ProductForm {
        ProductForm {
            name: "Lavender Hand Balm".to_owned(),
            slug: String::new(),
            description: "  A rich balm.\n\nMade in small batches.  ".to_owned(),
            price: "14.50".to_owned(),
            inventory_quantity: "25".to_owned(),
            track_inventory: Some("on".to_owned()),
            active: Some("on".to_owned()),
            featured: None,
            csrf_token: String::new(),
        }
    }

    #[test]
    fn test_parse_product_form_derives_slug_from_name() {
        let input = parse_product_form(&base_form()).unwrap();

        assert_eq!(input.slug.as_str(), "lavender-hand-balm");
        assert_eq!(input.price, Money::from_cents(1450));
        assert_eq!(input.inventory_quantity, 25);
        assert!(input.track_inventory);
        assert!(input.active);
        assert!(!input.featured);
    }

    #[test]
    fn test_parse_product_form_prefers_explicit_slug() {
        let mut form = base_form();
        form.slug = "balm-lavender".to_owned();

        let input = parse_product_form(&form).unwrap();
        assert_eq!(input.slug.as_str(), "balm-lavender");
    }

    #[test]
    fn test_parse_product_form_rejects_bad_fields() {
        let mut form = base_form();
        form.price = "lots".to_owned();
        assert!(parse_product_form(&form).is_err());

        let mut form = base_form();
        form.name = "   ".to_owned();
        assert!(parse_product_form(&form).is_err());

        let mut form = base_form();
        form.inventory_quantity = "-3".to_owned();
        assert!(parse_product_form(&form).is_err());
    }

    #[test]
    fn test_parse_variant_form_empty_fields_mean_inherit() {
        let form = VariantForm {
            name: "100ml".to_owned(),
            sku: String::new(),
            price: String::new(),
            inventory_quantity: String::new(),
            position: String::new(),
            csrf_token: String::new(),
        };

        let input = parse_variant_form(&form).unwrap();
        assert!(input.sku.is_none());
        assert!(input.price.is_none());
        assert!(input.inventory_quantity.is_none());
        assert_eq!(input.position, 0);
    }

    #[test]
    fn test_parse_variant_form_keeps_overrides() {
        let form = VariantForm {
            name: "Twin pack".to_owned(),
            sku: " WB-TP-01 ".to_owned(),
            price: "$26.00".to_owned(),
            inventory_quantity: "8".to_owned(),
            position: "2".to_owned(),
            csrf_token: String::new(),
        };

        let input = parse_variant_form(&form).unwrap();
        assert_eq!(input.sku.as_deref(), Some("WB-TP-01"));
        assert_eq!(input.price, Some(Money::from_cents(2600)));
        assert_eq!(input.inventory_quantity, Some(8));
        assert_eq!(input.position, 2);
    }
}
