/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    api::{SHARED_CSTATE, Server, acl::RightsCache, auth::AccessToken},
    mailbox::cache::{MailboxCache, MailboxRef},
};
use jmap_proto::{
    error::{method::MethodError, request::RequestError},
    request::{
        Call, Request,
        capability::{Capability, CoreCapabilities},
        reference::{IdResolver, ResultReference},
    },
    response::Response,
    types::{acl::Acl, state::State, type_state::DataType},
};
use serde_json::Value;
use std::{collections::VecDeque, time::Instant};
use store::{MailboxHandle, MailboxInfo};
use utils::map::bitmap::Bitmap;

/// State threaded through one request envelope: the authenticated and
/// target identities, the current call, and the four request-scoped
/// caches.
pub struct RequestContext<'x> {
    pub server: &'x Server,
    pub user_id: String,
    pub account_id: String,
    pub using: u32,

    pub method_name: String,
    pub call_id: String,
    pub arguments: Value,
    pub shared_cstate: bool,

    /// Sticky: once set, every following mailbox open is read-write.
    pub force_mailbox_rw: bool,

    pub response: Response,
    sub_calls: VecDeque<Call>,
    pub(crate) mailboxes: MailboxCache,
    pub(crate) rights: RightsCache,
    pub(crate) counters: [Option<u64>; DataType::COUNT],
}

pub trait RequestHandler {
    fn handle_request(
        &self,
        json: &[u8],
        access_token: &AccessToken,
    ) -> Result<Response, RequestError>;
}

impl RequestHandler for Server {
    fn handle_request(
        &self,
        json: &[u8],
        access_token: &AccessToken,
    ) -> Result<Response, RequestError> {
        let core = &self.settings.core;
        let request = Request::parse(json, core.max_calls_in_request, core.max_size_request)?;
        let using = request.capabilities(self.settings.can_use())?;
        Ok(self.process_request(request, using, access_token))
    }
}

impl Server {
    fn process_request(
        &self,
        request: Request,
        using: u32,
        access_token: &AccessToken,
    ) -> Response {
        let add_created_ids = request.created_ids.is_some();
        let mut ctx = RequestContext {
            server: self,
            user_id: access_token.user_id.clone(),
            account_id: access_token.user_id.clone(),
            using,
            method_name: String::new(),
            call_id: String::new(),
            arguments: Value::Null,
            shared_cstate: false,
            force_mailbox_rw: false,
            response: Response::new(
                State::default(),
                request.created_ids.unwrap_or_default(),
                request.method_calls.len(),
            ),
            sub_calls: VecDeque::new(),
            mailboxes: MailboxCache::default(),
            rights: RightsCache::default(),
            counters: [None; DataType::COUNT],
        };

        for call in request.method_calls {
            self.process_call(&mut ctx, call);

            // Deferred sub-calls run between their parent and the
            // next original call; sub-calls may schedule further
            // sub-calls.
            while let Some(sub_call) = ctx.sub_calls.pop_front() {
                self.process_call(&mut ctx, sub_call);
            }
        }

        ctx.finish(add_created_ids, access_token)
    }

    fn process_call(&self, ctx: &mut RequestContext<'_>, mut call: Call) {
        let op_start = Instant::now();

        let method = match self.settings.method(&call.name) {
            Some(method) => method,
            None => {
                tracing::debug!(method = %call.name, "unknown method");
                ctx.response
                    .push_error(call.id, MethodError::unknown_method(&call.name));
                return;
            }
        };

        if ctx.using & method.capability as u32 == 0 {
            ctx.response
                .push_error(call.id, MethodError::method_not_found(&call.name));
            return;
        }

        if let Err(error) = resolve_references(&ctx.response, &mut call.arguments) {
            tracing::debug!(method = %call.name, %error, "result reference resolution failed");
            ctx.response.push_error(call.id, error);
            return;
        }

        let account_id = call
            .arguments
            .get("accountId")
            .and_then(Value::as_str)
            .filter(|account_id| !account_id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ctx.user_id.clone());
        let shared_cstate = method.flags & SHARED_CSTATE != 0;

        // Exclusive conversational state, or a different target
        // account, invalidates the cached counters.
        if !shared_cstate || account_id != ctx.account_id {
            ctx.counters = [None; DataType::COUNT];
        }

        ctx.method_name = call.name;
        ctx.call_id = call.id;
        ctx.account_id = account_id;
        ctx.arguments = call.arguments;
        ctx.shared_cstate = shared_cstate;

        match (method.handler)(ctx) {
            Ok(()) => {
                tracing::debug!(
                    method = method.name,
                    account_id = %ctx.account_id,
                    elapsed = ?op_start.elapsed(),
                    "method call"
                );
            }
            Err(error) => {
                tracing::debug!(method = method.name, %error, "method call failed");
                let call_id = ctx.call_id.clone();
                ctx.response.push_error(call_id, error);
            }
        }
    }
}

/// Rewrites every `#`-prefixed argument with the value extracted from
/// an earlier response. Creation-id references inside string values
/// are the shapes' job; this walk only handles result references.
fn resolve_references(response: &Response, arguments: &mut Value) -> Result<(), MethodError> {
    let map = match arguments.as_object_mut() {
        Some(map) => map,
        None => return Ok(()),
    };

    let reference_keys = map
        .keys()
        .filter(|key| key.starts_with('#'))
        .cloned()
        .collect::<Vec<_>>();

    for key in reference_keys {
        let target = key[1..].to_string();
        if map.contains_key(&target) {
            return Err(MethodError::invalid_arguments([target]));
        }
        let reference = serde_json::from_value::<ResultReference>(map.remove(&key).unwrap())
            .map_err(|err| {
                MethodError::invalid_result_reference(format!("Invalid result reference: {}", err))
            })?;
        let resolved = response.eval_result_reference(&reference)?;
        map.insert(target, resolved);
    }

    Ok(())
}

impl<'x> RequestContext<'x> {
    pub fn store(&self) -> &dyn store::Store {
        &*self.server.store
    }

    pub fn core(&self) -> &CoreCapabilities {
        &self.server.settings.core
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.using & capability as u32 != 0
    }

    /// Appends the current call's reply. A handler may reply more
    /// than once.
    pub fn ok(&mut self, payload: Value) {
        let name = self.method_name.clone();
        let id = self.call_id.clone();
        self.response.push_response(name, payload, id);
    }

    pub fn error(&mut self, error: MethodError) {
        let id = self.call_id.clone();
        self.response.push_error(id, error);
    }

    /// Schedules a call to run after the current one completes. When
    /// no client id is given, the sub-call inherits the parent's.
    pub fn add_sub_call(
        &mut self,
        name: impl Into<String>,
        arguments: Value,
        client_id: Option<String>,
    ) {
        let id = client_id.unwrap_or_else(|| self.call_id.clone());
        self.sub_calls.push_back(Call::new(name, arguments, id));
    }

    /// Binds a creation id to a server id; entries are append-only
    /// within a request.
    pub fn add_id(&mut self, creation_id: &str, id: &str) {
        if self.response.created_id(creation_id).is_none() {
            self.response
                .push_created_id(creation_id.to_string(), id.to_string());
        }
    }

    pub fn lookup_id(&self, creation_id: &str) -> Option<&str> {
        self.response.created_id(creation_id)
    }

    pub fn open_mailbox(&mut self, name: &str, rw: bool) -> Result<MailboxRef, MethodError> {
        self.mailboxes
            .open(
                &*self.server.store,
                &self.account_id,
                name,
                rw,
                self.force_mailbox_rw,
            )
            .map_err(MethodError::from)
    }

    pub fn mailbox(&self, mailbox: MailboxRef) -> &MailboxHandle {
        self.mailboxes.get(mailbox)
    }

    pub fn close_mailbox(&mut self, mailbox: MailboxRef) {
        self.mailboxes.close(mailbox);
    }

    pub fn is_open_mailbox(&self, name: &str) -> bool {
        self.mailboxes.is_open(&self.account_id, name)
    }

    pub fn myrights(&mut self, mailbox: &MailboxInfo) -> Bitmap<Acl> {
        self.rights
            .myrights(&*self.server.store, &self.user_id, mailbox)
    }

    pub fn has_rights(&mut self, mailbox: &MailboxInfo, mask: Bitmap<Acl>) -> bool {
        self.myrights(mailbox).contains_all(mask)
    }

    pub fn myrights_byname(&mut self, name: &str) -> Result<Bitmap<Acl>, MethodError> {
        let mailbox = self.server.store.mailbox_lookup(&self.account_id, name)?;
        Ok(self.myrights(&mailbox))
    }

    pub fn has_rights_byname(&mut self, name: &str, mask: Bitmap<Acl>) -> Result<bool, MethodError> {
        Ok(self.myrights_byname(name)?.contains_all(mask))
    }

    pub fn invalidate_rights(&mut self, name: &str) {
        let account_id = self.account_id.clone();
        self.rights.invalidate(&account_id, name);
    }

    /// Teardown: releases every cached mailbox, mints the final
    /// session state, and drops the creation-id map unless the client
    /// asked for it.
    fn finish(mut self, add_created_ids: bool, access_token: &AccessToken) -> Response {
        self.mailboxes.finish(&*self.server.store);
        if !add_created_ids {
            self.response.created_ids.clear();
        }
        self.response.session_state = State::new(
            self.server
                .store
                .session_state(&access_token.user_id)
                .unwrap_or_default(),
        );
        self.response
    }
}

impl IdResolver for RequestContext<'_> {
    fn created_id(&self, creation_id: &str) -> Option<&str> {
        self.response.created_id(creation_id)
    }
}
