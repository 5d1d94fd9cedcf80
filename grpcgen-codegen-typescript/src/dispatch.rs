//! Runtime dispatch semantics of the emitted server.
//!
//! A [`DispatchTable`] maps wire method paths to adapters over registered
//! handlers, mirroring what the generated `Add*` methods wire up: rename
//! the request, invoke the handler, rename the response, and keep the
//! error shape uniform. Handler errors carrying a [`StatusError`] forward
//! their status code; anything else is passed to the error hook and then
//! collapsed to [`StatusCode::Internal`] so the original error never
//! crosses the adapter boundary. Adapters hold per-call state only, so
//! interleaved in-flight calls cannot observe each other.

use eyre::Result;
use grpcgen_codegen::NamingTransformer;
use grpcgen_ir::{FieldType, Method, NamespacedSymbol, ProtoDefinition, Service};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::transform::{named_to_wire, wire_to_named};

/// gRPC status codes, by their wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl StatusCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A classified handler failure whose status code is forwarded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("grpc call failed with status {code:?}")]
pub struct StatusError {
    pub code: StatusCode,
}

impl StatusError {
    pub fn new(code: StatusCode) -> Self {
        Self { code }
    }
}

/// A registered handler: takes the named-shaped request, returns the
/// named-shaped response.
pub type Handler = Box<dyn Fn(Value) -> Result<Value> + Send + Sync>;

type ErrorHook = Box<dyn Fn(&eyre::Report) + Send + Sync>;

struct Route {
    input: NamespacedSymbol,
    output: NamespacedSymbol,
    handler: Handler,
}

/// Wire method path -> adapter mapping.
pub struct DispatchTable<'a> {
    definition: &'a ProtoDefinition,
    transformer: &'a dyn NamingTransformer,
    routes: IndexMap<String, Route>,
    error_hook: Option<ErrorHook>,
}

impl<'a> DispatchTable<'a> {
    pub fn new(definition: &'a ProtoDefinition, transformer: &'a dyn NamingTransformer) -> Self {
        Self {
            definition,
            transformer,
            routes: IndexMap::new(),
            error_hook: None,
        }
    }

    /// Observe unclassified handler errors before they collapse to
    /// [`StatusCode::Internal`].
    pub fn set_error_hook(&mut self, hook: impl Fn(&eyre::Report) + Send + Sync + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    /// Register a handler under `/<fq.Service>/<method>`.
    pub fn add_method(
        &mut self,
        service: &Service,
        method: &Method,
        handler: Handler,
    ) -> Result<()> {
        let (FieldType::Message(input), FieldType::Message(output)) =
            (&method.input, &method.output)
        else {
            eyre::bail!(
                "method `{}` of `{}` must take and return messages",
                method.symbol.name(),
                service.symbol.assemble()
            );
        };
        let path = format!("/{}/{}", service.symbol.assemble(), method.symbol.name());
        self.routes.insert(
            path,
            Route {
                input: input.clone(),
                output: output.clone(),
                handler,
            },
        );
        Ok(())
    }

    /// Dispatch one wire-shaped request. Returns the wire-shaped response
    /// or the status the caller should report.
    pub fn dispatch(&self, path: &str, request: &Value) -> Result<Value, StatusError> {
        let Some(route) = self.routes.get(path) else {
            return Err(StatusError::new(StatusCode::Unimplemented));
        };

        let named = wire_to_named(self.definition, self.transformer, &route.input, request)
            .map_err(|report| self.collapse(report))?;
        let response = (route.handler)(named).map_err(|report| self.collapse(report))?;
        named_to_wire(self.definition, self.transformer, &route.output, &response)
            .map_err(|report| self.collapse(report))
    }

    fn collapse(&self, report: eyre::Report) -> StatusError {
        if let Some(status) = report.downcast_ref::<StatusError>() {
            return *status;
        }
        if let Some(hook) = &self.error_hook {
            hook(&report);
        }
        StatusError::new(StatusCode::Internal)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use grpcgen_codegen::DefaultTransformer;
    use grpcgen_ir::ReflectionNode;
    use serde_json::json;

    use super::*;

    fn build(descriptor: serde_json::Value) -> ProtoDefinition {
        let root = ReflectionNode::from_descriptor(&descriptor).unwrap();
        ProtoDefinition::from_reflection(&root).unwrap()
    }

    fn simple_service() -> ProtoDefinition {
        build(json!({
            "nested": {
                "test": {
                    "nested": {
                        "SimpleMessage": {
                            "fields": {
                                "username": { "type": "string", "id": 1 },
                                "some_number": { "type": "uint32", "id": 2 }
                            }
                        },
                        "SimpleService": {
                            "methods": {
                                "method1": {
                                    "requestType": "SimpleMessage",
                                    "responseType": "SimpleMessage"
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    fn register(
        table: &mut DispatchTable,
        definition: &ProtoDefinition,
        handler: Handler,
    ) {
        let service = definition.services().next().unwrap();
        let method = &service.methods[0];
        table.add_method(service, method, handler).unwrap();
    }

    #[test]
    fn test_round_trip_renames_request_and_response() {
        let definition = simple_service();
        let transformer = DefaultTransformer;
        let mut table = DispatchTable::new(&definition, &transformer);
        register(
            &mut table,
            &definition,
            Box::new(|named| {
                // the handler sees named fields
                assert_eq!(named, json!({ "username": "foobar", "someNumber": 42 }));
                let username = named["username"].as_str().unwrap_or_default();
                let number = named["someNumber"].as_u64().unwrap_or_default();
                Ok(json!({
                    "username": format!("{username}baz"),
                    "someNumber": number + 1,
                }))
            }),
        );

        let response = table
            .dispatch(
                "/test.SimpleService/method1",
                &json!({ "username": "foobar", "some_number": 42 }),
            )
            .unwrap();
        assert_eq!(
            response,
            json!({ "username": "foobarbaz", "some_number": 43 })
        );
    }

    #[test]
    fn test_classified_error_forwards_its_status() {
        let definition = simple_service();
        let transformer = DefaultTransformer;
        let mut table = DispatchTable::new(&definition, &transformer);
        register(
            &mut table,
            &definition,
            Box::new(|_| Err(StatusError::new(StatusCode::InvalidArgument).into())),
        );

        let status = table
            .dispatch("/test.SimpleService/method1", &json!({}))
            .unwrap_err();
        assert_eq!(status.code, StatusCode::InvalidArgument);
        assert_eq!(status.code.code(), 3);
    }

    #[test]
    fn test_unclassified_error_hits_hook_then_collapses_to_internal() {
        let definition = simple_service();
        let transformer = DefaultTransformer;
        let mut table = DispatchTable::new(&definition, &transformer);
        register(
            &mut table,
            &definition,
            Box::new(|_| Err(eyre::eyre!("handler exploded"))),
        );
        let observed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&observed);
        table.set_error_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let status = table
            .dispatch("/test.SimpleService/method1", &json!({}))
            .unwrap_err();
        assert_eq!(status.code, StatusCode::Internal);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_route_is_unimplemented() {
        let definition = simple_service();
        let transformer = DefaultTransformer;
        let table = DispatchTable::new(&definition, &transformer);
        let status = table
            .dispatch("/test.SimpleService/nope", &json!({}))
            .unwrap_err();
        assert_eq!(status.code, StatusCode::Unimplemented);
    }
}
