/// Read helpers shared by every client that wraps a `ResourceClient`.
///
/// Generates `find_<entity>` (row or `None`), `get_<entity>` (row or the
/// domain `NotFound` error) and a crate-internal `shutdown`.
#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        ::paste::paste! {
            #[allow(dead_code)]
            impl $client_name {
                #[::tracing::instrument(skip(self))]
                pub async fn [<find_ $entity_name_snake>](&self, id: String) -> Result<Option<$entity>, $error> {
                    ::tracing::debug!("Sending request");
                    self.inner.get(id).await.map_err(<$error>::from)
                }

                #[::tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<$entity, $error> {
                    ::tracing::debug!("Sending request");
                    self.inner
                        .get(id.clone())
                        .await
                        .map_err(<$error>::from)?
                        .ok_or(<$error>::NotFound(id))
                }

                pub(crate) async fn shutdown(&self) -> Result<(), $error> {
                    self.inner.shutdown().await.map_err(<$error>::from)
                }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(inner: $crate::actor_framework::ResourceClient<$entity>) -> Self {
                Self { inner }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        $crate::impl_client_new!($client_name, $entity);
        $crate::impl_client_methods!($client_name, $entity, $error, $entity_name_snake);
    };
}

/// Generate request/reply methods for a hand-written service actor.
///
/// Each method sends one request variant with a oneshot reply channel and
/// waits for the answer, bounded by the client's `timeout`. A trailing
/// `skip(...)` keeps bulky parameters out of the span.
#[macro_export]
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident, Error = $error_type:ty) => {
        $crate::client_method!($client => fn $method($($param: $param_type),*) -> $return_type as $request::$variant, Error = $error_type, skip());
    };
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident, Error = $error_type:ty, skip($($skipped:ident),*)) => {
        impl $client {
            #[::tracing::instrument(skip(self $(, $skipped)*))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $error_type> {
                ::tracing::debug!("Sending request");
                let (respond_to, response) = ::tokio::sync::oneshot::channel();
                let exchange = async {
                    self.sender
                        .send($request::$variant {
                            $($param,)*
                            respond_to,
                        })
                        .await
                        .map_err(|_| <$error_type>::Unavailable("Actor closed".to_string()))?;
                    response
                        .await
                        .map_err(|_| <$error_type>::Unavailable("Actor dropped".to_string()))?
                };
                ::tokio::time::timeout(self.timeout, exchange)
                    .await
                    .map_err(|_| <$error_type>::Timeout(self.timeout))?
            }
        }
    };
}
