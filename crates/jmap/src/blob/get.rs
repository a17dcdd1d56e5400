/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::request::RequestContext;
use jmap_proto::{
    error::method::MethodError,
    method::{PropertyDef, get::Get},
    parser::Parser,
    types::{
        acl::Acl,
        blob::BlobId,
        id::{EmailId, ThreadId},
    },
};
use serde_json::{Map, Value, json};

const BLOB_PROPS: &[PropertyDef] = &[
    PropertyDef::new("id", PropertyDef::SERVER_SET | PropertyDef::IMMUTABLE),
    PropertyDef::new("mailboxIds", PropertyDef::SERVER_SET | PropertyDef::IMMUTABLE),
    PropertyDef::new("threadIds", PropertyDef::SERVER_SET | PropertyDef::IMMUTABLE),
    PropertyDef::new("emailIds", PropertyDef::SERVER_SET | PropertyDef::IMMUTABLE),
];

/// `Blob/get`: reports the mailboxes, emails and threads carrying
/// each blob the caller may see.
pub(crate) fn blob_get(ctx: &mut RequestContext<'_>) -> Result<(), MethodError> {
    let arguments = std::mem::take(&mut ctx.arguments);
    let mut parser = Parser::new();
    let mut get = Get::parse(
        &arguments,
        &mut parser,
        &*ctx,
        ctx.core(),
        BLOB_PROPS,
        false,
        None,
    )?;
    if get.account_id.is_empty() {
        get.account_id = ctx.account_id.clone();
    }

    for id in get.ids.take().unwrap_or_default() {
        let mut mailbox_ids = Map::new();
        let mut email_ids = Map::new();
        let mut thread_ids = Map::new();

        if let Some(blob_id) = BlobId::parse(&id) {
            for location in ctx.store().blob_locate(&ctx.account_id, &blob_id)? {
                let mailbox = match ctx.store().mailbox_lookup(&ctx.account_id, &location.mailbox)
                {
                    Ok(mailbox) => mailbox,
                    Err(_) => continue,
                };
                if !ctx.has_rights(&mailbox, Acl::read_items()) {
                    continue;
                }
                let opened = match ctx.open_mailbox(&location.mailbox, false) {
                    Ok(opened) => opened,
                    Err(error) => {
                        tracing::debug!(mailbox = %location.mailbox, %error, "cannot open mailbox");
                        continue;
                    }
                };

                mailbox_ids.insert(ctx.mailbox(opened).info.id.clone(), json!(true));
                email_ids.insert(EmailId::from_guid(&location.guid).to_string(), json!(true));
                thread_ids.insert(ThreadId::from_cid(location.cid).to_string(), json!(true));

                ctx.close_mailbox(opened);
            }
        }

        if !mailbox_ids.is_empty() {
            let mut blob = Map::new();
            blob.insert("id".to_string(), json!(id));
            if get.want("mailboxIds") {
                blob.insert("mailboxIds".to_string(), Value::Object(mailbox_ids));
            }
            if get.want("emailIds") {
                blob.insert("emailIds".to_string(), Value::Object(email_ids));
            }
            if get.want("threadIds") {
                blob.insert("threadIds".to_string(), Value::Object(thread_ids));
            }
            get.list.push(Value::Object(blob));
        } else {
            get.not_found.push(id);
        }
    }

    ctx.ok(get.reply());
    Ok(())
}
