use crate::{
    errors::{ApiError, ApiErrorResponse, ApiResult},
    schemas::gallery::{
        CreateGalleryRequest, DeletedResponse, EditGalleryRequest, GalleryIdsResponse,
        GalleryResponse, ImageResponse, LuminanceQuery, LuminanceResponse, OwnershipQuery,
        OwnershipResponse, SuccessResponse,
    },
    services::{
        auth::Claims,
        gallery::{GalleryEdit, GalleryService, NewGallery},
        luminance::{SampleDivisor, Tone, DEFAULT_SAMPLES},
        users::UserService,
        utils::now_timestamp,
    },
    AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_typed_multipart::TypedMultipart;
use validator::Validate;

fn current_user(user_claims: Option<Extension<Claims>>) -> ApiResult<Claims> {
    user_claims
        .map(|Extension(claims)| claims)
        .ok_or_else(|| ApiError::Unauthorized("未登录".to_string()))
}

/// 跳转目标只能是本站路径，拒绝 `//host`、`/\host` 形式和控制字符
fn local_redirect_target(target: &str) -> ApiResult<&str> {
    let local = target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control);

    if local {
        Ok(target)
    } else {
        Err(ApiError::BadRequest("redirect 必须是本站路径".to_string()))
    }
}

/// 只有作者本人或管理员可以修改相册，相册不存在时返回 404
async fn ensure_can_manage(app_state: &AppState, user_id: i32, gallery_id: i32) -> ApiResult<()> {
    GalleryService::get_gallery_by_id(&app_state.db, gallery_id).await?;
    if GalleryService::check_ownership(&app_state.db, user_id, gallery_id).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden("无权限操作该相册".to_string()))
    }
}

/// 获取所有相册
#[utoipa::path(
    get,
    path = "/v2/galleries",
    responses(
        (status = 200, description = "成功获取相册列表（按创建时间倒序）", body = Vec<GalleryResponse>)
    ),
    tag = "galleries"
)]
pub async fn list_galleries(State(app_state): State<AppState>) -> ApiResult<Json<Vec<GalleryResponse>>> {
    Ok(Json(GalleryService::get_all(&app_state.db).await?))
}

/// 获取所有相册 ID
#[utoipa::path(
    get,
    path = "/v2/galleries/ids",
    responses((status = 200, description = "成功获取相册 ID", body = GalleryIdsResponse)),
    tag = "galleries"
)]
pub async fn list_gallery_ids(State(app_state): State<AppState>) -> ApiResult<Json<GalleryIdsResponse>> {
    let ids = GalleryService::get_available_galleries(&app_state.db).await?;
    Ok(Json(GalleryIdsResponse { ids }))
}

/// 获取某个用户的所有相册
#[utoipa::path(
    get,
    path = "/v2/users/{user_id}/galleries",
    responses((status = 200, description = "成功获取用户相册", body = Vec<GalleryResponse>)),
    params(("user_id" = i32, Path, description = "用户 ID")),
    tag = "galleries"
)]
pub async fn list_user_galleries(
    State(app_state): State<AppState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<Vec<GalleryResponse>>> {
    Ok(Json(
        GalleryService::get_all_by_author(&app_state.db, user_id).await?,
    ))
}

/// 获取相册详情
#[utoipa::path(
    get,
    path = "/v2/galleries/{gallery_id}",
    responses(
        (status = 200, description = "成功获取相册", body = GalleryResponse),
        (status = 404, description = "相册不存在", body = ApiErrorResponse,
         example = json!({"error": "相册不存在", "status": 404}))
    ),
    params(("gallery_id" = i32, Path, description = "相册 ID")),
    tag = "galleries"
)]
pub async fn get_gallery(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
) -> ApiResult<Json<GalleryResponse>> {
    Ok(Json(
        GalleryService::get_gallery_by_id(&app_state.db, gallery_id).await?,
    ))
}

/// 创建相册
#[utoipa::path(
    post,
    path = "/v2/galleries",
    request_body(content = CreateGalleryRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "成功创建相册", body = GalleryResponse),
        (status = 400, description = "图片无效", body = ApiErrorResponse,
         examples(
             ("无法识别" = (value = json!({"error": "无法确定上传文件的图片类型", "status": 400}))),
             ("GIF 封面" = (value = json!({"error": "封面图片不能是 GIF，必须是 JPEG 或 PNG", "status": 400})))
         )),
        (status = 401, description = "未登录", body = ApiErrorResponse)
    ),
    tag = "galleries",
    security(("bearer_auth" = []))
)]
pub async fn create_gallery(
    State(app_state): State<AppState>,
    user_claims: Option<Extension<Claims>>,
    TypedMultipart(request): TypedMultipart<CreateGalleryRequest>,
) -> ApiResult<(StatusCode, Json<GalleryResponse>)> {
    let claims = current_user(user_claims)?;
    request.validate()?;

    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("相册名称不能为空".to_string()));
    }

    let now = now_timestamp();
    let data = NewGallery {
        author: claims.id,
        status: request.status,
        name: request.name,
        description: request.description,
        creation_date: request.creation_date.unwrap_or(now),
        modified_date: request.modified_date.unwrap_or(now),
        image: request.image.contents.to_vec(),
    };

    let created = GalleryService::create_gallery(
        &app_state.db,
        &app_state.storage,
        app_state.config.media.max_upload_bytes,
        data,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// 编辑相册
#[utoipa::path(
    put,
    path = "/v2/galleries/{gallery_id}",
    request_body = EditGalleryRequest,
    responses(
        (status = 200, description = "成功更新相册", body = GalleryResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 401, description = "未登录", body = ApiErrorResponse),
        (status = 403, description = "无权限", body = ApiErrorResponse),
        (status = 404, description = "相册不存在", body = ApiErrorResponse)
    ),
    params(("gallery_id" = i32, Path, description = "相册 ID")),
    tag = "galleries",
    security(("bearer_auth" = []))
)]
pub async fn edit_gallery(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
    user_claims: Option<Extension<Claims>>,
    Json(request): Json<EditGalleryRequest>,
) -> ApiResult<Json<GalleryResponse>> {
    let claims = current_user(user_claims)?;
    request.validate()?;
    ensure_can_manage(&app_state, claims.id, gallery_id).await?;

    let edit = GalleryEdit {
        id: gallery_id,
        status: request.status,
        name: request.name,
        description: request.description,
        modified_date: request.modified_date.unwrap_or_else(now_timestamp),
    };

    Ok(Json(GalleryService::edit_gallery(&app_state.db, edit).await?))
}

/// 删除相册
#[utoipa::path(
    delete,
    path = "/v2/galleries/{gallery_id}",
    responses(
        (status = 200, description = "成功删除相册", body = SuccessResponse),
        (status = 401, description = "未登录", body = ApiErrorResponse),
        (status = 403, description = "无权限", body = ApiErrorResponse),
        (status = 404, description = "相册不存在", body = ApiErrorResponse)
    ),
    params(("gallery_id" = i32, Path, description = "相册 ID")),
    tag = "galleries",
    security(("bearer_auth" = []))
)]
pub async fn delete_gallery(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
    user_claims: Option<Extension<Claims>>,
) -> ApiResult<Json<SuccessResponse>> {
    let claims = current_user(user_claims)?;
    ensure_can_manage(&app_state, claims.id, gallery_id).await?;

    GalleryService::delete_gallery_by_id(&app_state.db, &app_state.storage, gallery_id).await?;

    Ok(Json(SuccessResponse {
        message: "成功删除相册".to_string(),
    }))
}

/// 删除某个用户的所有相册
#[utoipa::path(
    delete,
    path = "/v2/users/{user_id}/galleries",
    responses(
        (status = 200, description = "成功删除用户相册", body = DeletedResponse),
        (status = 401, description = "未登录", body = ApiErrorResponse),
        (status = 403, description = "只能删除自己的相册", body = ApiErrorResponse)
    ),
    params(("user_id" = i32, Path, description = "用户 ID")),
    tag = "galleries",
    security(("bearer_auth" = []))
)]
pub async fn delete_user_galleries(
    State(app_state): State<AppState>,
    Path(user_id): Path<i32>,
    user_claims: Option<Extension<Claims>>,
) -> ApiResult<Json<DeletedResponse>> {
    let claims = current_user(user_claims)?;
    if claims.id != user_id && !UserService::is_admin(&app_state.db, claims.id).await? {
        return Err(ApiError::Forbidden("只能删除自己的相册".to_string()));
    }

    let deleted =
        GalleryService::delete_gallery_by_user(&app_state.db, &app_state.storage, user_id).await?;

    Ok(Json(DeletedResponse { deleted }))
}

/// 获取相册图片
#[utoipa::path(
    get,
    path = "/v2/galleries/{gallery_id}/images",
    responses((status = 200, description = "成功获取相册图片", body = Vec<ImageResponse>)),
    params(("gallery_id" = i32, Path, description = "相册 ID")),
    tag = "galleries"
)]
pub async fn list_gallery_images(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
) -> ApiResult<Json<Vec<ImageResponse>>> {
    Ok(Json(
        GalleryService::get_images_by_gallery_id(&app_state.db, gallery_id).await?,
    ))
}

/// 检查相册归属，无权限时跳转到 `redirect`
#[utoipa::path(
    get,
    path = "/v2/galleries/{gallery_id}/ownership",
    responses(
        (status = 200, description = "当前用户是作者或管理员", body = OwnershipResponse),
        (status = 303, description = "无权限，跳转到 redirect"),
        (status = 400, description = "redirect 不是本站路径", body = ApiErrorResponse)
    ),
    params(("gallery_id" = i32, Path, description = "相册 ID"), OwnershipQuery),
    tag = "galleries",
    security((), ("bearer_auth" = []))
)]
pub async fn check_gallery_ownership(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
    Query(query): Query<OwnershipQuery>,
    user_claims: Option<Extension<Claims>>,
) -> ApiResult<Response> {
    let redirect = local_redirect_target(&query.redirect)?;

    let owned = match user_claims {
        Some(Extension(claims)) => {
            GalleryService::check_ownership(&app_state.db, claims.id, gallery_id).await?
        }
        None => false,
    };

    if owned {
        Ok(Json(OwnershipResponse { owned }).into_response())
    } else {
        tracing::debug!("相册归属检查未通过: gallery_id={}", gallery_id);
        Ok(Redirect::to(redirect).into_response())
    }
}

/// 相册封面的平均亮度，用于选择明/暗样式
#[utoipa::path(
    get,
    path = "/v2/galleries/{gallery_id}/teaser/luminance",
    responses(
        (status = 200, description = "成功计算亮度", body = LuminanceResponse),
        (status = 404, description = "相册不存在", body = ApiErrorResponse)
    ),
    params(("gallery_id" = i32, Path, description = "相册 ID"), LuminanceQuery),
    tag = "galleries"
)]
pub async fn get_teaser_luminance(
    State(app_state): State<AppState>,
    Path(gallery_id): Path<i32>,
    Query(query): Query<LuminanceQuery>,
) -> ApiResult<Json<LuminanceResponse>> {
    let samples = query.samples.unwrap_or(DEFAULT_SAMPLES);
    if samples == 0 {
        return Err(ApiError::BadRequest("samples 不能小于 1".to_string()));
    }
    let divisor = if query.legacy {
        SampleDivisor::LegacyPlusOne
    } else {
        SampleDivisor::SampleCount
    };

    let luminance = GalleryService::teaser_luminance(
        &app_state.db,
        &app_state.storage,
        gallery_id,
        samples,
        divisor,
    )
    .await?;

    Ok(Json(LuminanceResponse {
        luminance,
        tone: Tone::from_luminance(luminance),
    }))
}
