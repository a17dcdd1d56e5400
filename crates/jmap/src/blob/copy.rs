/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::request::RequestContext;
use jmap_proto::{
    error::{method::MethodError, set::SetError},
    method::copy::Copy,
    parser::Parser,
    types::{acl::Acl, blob::BlobId},
};
use serde_json::json;
use store::StoreError;

/// `Blob/copy`: stages each source blob into the target account's
/// upload collection. Failures are per-blob; blobs have no `/set`, so
/// `onSuccessDestroyOriginal` never schedules a destroy here.
pub(crate) fn blob_copy(ctx: &mut RequestContext<'_>) -> Result<(), MethodError> {
    let arguments = std::mem::take(&mut ctx.arguments);
    let mut parser = Parser::new();
    let mut copy = Copy::parse(&arguments, &mut parser, &*ctx, ctx.core(), true)?;
    if copy.account_id.is_empty() {
        copy.account_id = ctx.account_id.clone();
        if copy.from_account_id == copy.account_id {
            return Err(MethodError::invalid_arguments(["fromAccountId".to_string()]));
        }
    }

    let from_account_id = copy.from_account_id.clone();
    let account_id = copy.account_id.clone();

    for id in std::mem::take(&mut copy.blob_ids) {
        let blob_id = match BlobId::parse(&id) {
            Some(blob_id) => blob_id,
            None => {
                copy.not_created(
                    id,
                    SetError::blob_not_found().with_description("Invalid blob id."),
                );
                continue;
            }
        };

        if !has_access_blob(ctx, &from_account_id, &blob_id)? {
            copy.not_created(
                id,
                SetError::blob_not_found().with_description(
                    "blobId does not exist or not enough permissions to access it.",
                ),
            );
            continue;
        }

        let content = match ctx.store().blob_content(&from_account_id, &blob_id) {
            Ok(content) => content,
            Err(StoreError::NotFound) => {
                copy.not_created(id, SetError::blob_not_found());
                continue;
            }
            Err(error) => return Err(error.into()),
        };

        match ctx.store().blob_reserve(
            &ctx.user_id,
            &account_id,
            &content.data,
            content.content_type.as_deref(),
        ) {
            Ok(dest_blob_id) => {
                copy.created(id.clone(), json!(dest_blob_id.to_string()));
                copy.copied_source(id);
            }
            Err(StoreError::AccountNotFound | StoreError::PermissionDenied) => {
                copy.not_created(id, SetError::to_account_not_found());
            }
            Err(error) => return Err(error.into()),
        }
    }

    ctx.ok(copy.reply());
    Ok(())
}

/// True when the blob exists in the account and the authenticated
/// user may read a mailbox containing it.
fn has_access_blob(
    ctx: &mut RequestContext<'_>,
    account_id: &str,
    blob_id: &BlobId,
) -> Result<bool, MethodError> {
    if ctx.user_id == account_id {
        return Ok(ctx.store().blob_content(account_id, blob_id).is_ok());
    }
    for location in ctx.store().blob_locate(account_id, blob_id)? {
        let mailbox = match ctx.store().mailbox_lookup(account_id, &location.mailbox) {
            Ok(mailbox) => mailbox,
            Err(_) => continue,
        };
        if ctx.has_rights(&mailbox, Acl::read_items()) {
            return Ok(true);
        }
    }
    Ok(false)
}
