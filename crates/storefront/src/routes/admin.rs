//! Product administration.
//!
//! Every handler takes [`RequireAdmin`], which re-reads the admin flag from
//! the database. Product forms are multipart because they carry the image.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use emporium_core::ProductId;

use super::PageContext;
use crate::db::{ProductRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::{FlashLevel, Product, ProductInput, User};
use crate::services::UploadError;
use crate::state::AppState;

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub users: Vec<User>,
    pub products: Vec<Product>,
}

/// Add/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub name: String,
    pub description: String,
    pub price: String,
    /// Image currently stored for the product (edit only).
    pub current_image: Option<String>,
    pub image_required: bool,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn for_new(page: PageContext) -> Self {
        Self {
            page,
            heading: "Add product",
            action: "/admin/add_product".to_string(),
            name: String::new(),
            description: String::new(),
            price: String::new(),
            current_image: None,
            image_required: true,
            error: None,
        }
    }

    fn for_existing(page: PageContext, product: &Product) -> Self {
        Self {
            page,
            heading: "Edit product",
            action: format!("/admin/edit_product/{}", product.id),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            current_image: Some(product.image_src()),
            image_required: false,
            error: None,
        }
    }

    /// Keep what the admin typed and show the error.
    fn with_submission(mut self, submission: ProductSubmission, error: String) -> Self {
        self.name = submission.name;
        self.description = submission.description;
        self.price = submission.price;
        self.error = Some(error);
        self
    }
}

/// A file part of the product form.
struct ImageUpload {
    filename: String,
    bytes: Bytes,
}

/// Raw fields of the multipart product form.
#[derive(Default)]
struct ProductSubmission {
    name: String,
    description: String,
    price: String,
    image: Option<ImageUpload>,
}

fn multipart_error(e: &MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Read the product form. A file input left empty yields no image.
async fn read_submission(mut multipart: Multipart) -> Result<ProductSubmission> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
                if !filename.is_empty() || !bytes.is_empty() {
                    submission.image = Some(ImageUpload { filename, bytes });
                }
            }
            "name" | "description" | "price" => {
                let value = field.text().await.map_err(|e| multipart_error(&e))?;
                match field_name.as_str() {
                    "name" => submission.name = value,
                    "description" => submission.description = value,
                    _ => submission.price = value,
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Store the uploaded image, separating the uploader's mistakes from I/O
/// failures.
async fn store_image(
    state: &AppState,
    image: &ImageUpload,
) -> Result<std::result::Result<String, UploadError>> {
    match state.uploads().save(&image.filename, &image.bytes).await {
        Ok(url) => Ok(Ok(url)),
        Err(e) if e.is_user_error() => Ok(Err(e)),
        Err(e) => Err(e.into()),
    }
}

/// Users and products overview.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<DashboardTemplate> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    let products = ProductRepository::new(state.pool()).list_newest().await?;

    Ok(DashboardTemplate {
        page: PageContext::load(&session).await,
        users,
        products,
    })
}

/// Empty product form.
pub async fn add_product_page(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> ProductFormTemplate {
    ProductFormTemplate::for_new(PageContext::load(&session).await)
}

/// Create a product from the multipart form.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let submission = read_submission(multipart).await?;

    let input = match ProductInput::parse(
        &submission.name,
        &submission.description,
        &submission.price,
    ) {
        Ok(input) => input,
        Err(e) => {
            let page = PageContext::load(&session).await;
            return Ok(ProductFormTemplate::for_new(page)
                .with_submission(submission, e.to_string())
                .into_response());
        }
    };

    let stored = match &submission.image {
        Some(image) => store_image(&state, image).await?,
        None => Err(UploadError::MissingFile),
    };
    let image_url = match stored {
        Ok(url) => url,
        Err(e) => {
            let page = PageContext::load(&session).await;
            return Ok(ProductFormTemplate::for_new(page)
                .with_submission(submission, e.to_string())
                .into_response());
        }
    };

    let product = match ProductRepository::new(state.pool())
        .create(&input, &image_url)
        .await
    {
        Ok(product) => product,
        Err(e) => {
            state.uploads().discard(&image_url).await;
            return Err(e.into());
        }
    };
    tracing::info!(product_id = %product.id, "Product added");

    push_flash(&session, FlashLevel::Success, "Product added.").await?;
    Ok(Redirect::to("/admin").into_response())
}

/// Product form prefilled with the stored values.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn edit_product_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate::for_existing(
        PageContext::load(&session).await,
        &product,
    ))
}

/// Update a product; the image is replaced only when a new one is sent.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let products = ProductRepository::new(state.pool());
    let product = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let submission = read_submission(multipart).await?;

    let input = match ProductInput::parse(
        &submission.name,
        &submission.description,
        &submission.price,
    ) {
        Ok(input) => input,
        Err(e) => {
            let page = PageContext::load(&session).await;
            return Ok(ProductFormTemplate::for_existing(page, &product)
                .with_submission(submission, e.to_string())
                .into_response());
        }
    };

    let stored = match &submission.image {
        Some(image) => Some(store_image(&state, image).await?),
        None => None,
    };
    let image_url = match stored.transpose() {
        Ok(url) => url,
        Err(e) => {
            let page = PageContext::load(&session).await;
            return Ok(ProductFormTemplate::for_existing(page, &product)
                .with_submission(submission, e.to_string())
                .into_response());
        }
    };

    if let Err(e) = products.update(id, &input, image_url.as_deref()).await {
        if let Some(url) = &image_url {
            state.uploads().discard(url).await;
        }
        return Err(e.into());
    }
    tracing::info!(image_replaced = image_url.is_some(), "Product updated");

    push_flash(&session, FlashLevel::Success, "Product updated.").await?;
    Ok(Redirect::to("/admin").into_response())
}

/// Delete a product. Products that have been ordered are kept.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match ProductRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!("Product deleted");
            push_flash(&session, FlashLevel::Success, "Product deleted.").await?;
        }
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!("Refused to delete ordered product");
            push_flash(
                &session,
                FlashLevel::Danger,
                "This product appears in existing orders and cannot be deleted.",
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin"))
}
