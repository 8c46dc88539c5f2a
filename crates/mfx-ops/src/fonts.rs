//! Font management operations over the [`FontRegistry`](mfx_fonts::FontRegistry).

use mfx_core::{Error, PayloadContent, Payloads, Result};
use mfx_fonts::FontUpload;
use serde_json::json;

use crate::context::OpContext;
use crate::item::ItemOutput;
use crate::operation::{FontKeyParams, ListFontsParams, UploadFontParams};

pub fn list_fonts(ctx: &OpContext, params: &ListFontsParams) -> Result<ItemOutput> {
    let fonts = ctx.fonts.list(params.filter);
    Ok(ItemOutput::json(json!({
        "count": fonts.len(),
        "fonts": fonts,
    })))
}

pub async fn upload_font(
    ctx: &OpContext,
    params: &UploadFontParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    let payload = payloads
        .get(&params.binary_property)
        .ok_or_else(|| Error::MissingPayload {
            property: params.binary_property.clone(),
        })?;
    let data = match &payload.content {
        PayloadContent::Bytes(bytes) => bytes.to_vec(),
        PayloadContent::File(path) => tokio::fs::read(path).await?,
    };
    if data.is_empty() {
        return Err(Error::validation("Uploaded font file is empty."));
    }

    let entry = ctx.fonts.upload(FontUpload {
        key: &params.font_key,
        name: params.font_name.as_deref(),
        description: params.description.as_deref(),
        file_name: payload.file_name.as_deref(),
        data: &data,
    })?;
    Ok(ItemOutput::json(json!({ "success": true, "font": entry })))
}

pub fn delete_font(ctx: &OpContext, params: &FontKeyParams) -> Result<ItemOutput> {
    let entry = ctx.fonts.delete(&params.font_key)?;
    Ok(ItemOutput::json(json!({ "success": true, "deleted": entry })))
}

pub fn validate_font_key(ctx: &OpContext, params: &FontKeyParams) -> Result<ItemOutput> {
    let validation = ctx.fonts.validate_key(&params.font_key);
    Ok(ItemOutput::json(serde_json::to_value(validation)?))
}

pub fn font_info(ctx: &OpContext, params: &FontKeyParams) -> Result<ItemOutput> {
    let entry = ctx.fonts.info(&params.font_key)?;
    Ok(ItemOutput::json(serde_json::to_value(entry)?))
}
