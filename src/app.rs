use crate::config::{AppConfig, HttpConfig};
use crate::http::create_app;
use crate::relay::RelayManager;
use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::log::{error, info};

pub struct AppHandles {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}
impl AppHandles {
    pub fn new(config: AppConfig) -> Result<AppHandles> {
        let mut tasks = Vec::new();

        let relay = RelayManager::new(&config);
        tasks.push(("HTTP Server", Self::start_http_server(config.http, relay)?));

        Ok(AppHandles { tasks })
    }

    pub async fn run(self) {
        let futures: Vec<_> = self
            .tasks
            .into_iter()
            .map(|(name, handle)| {
                info!("Starting task: {name}");
                Box::pin(async move {
                    match handle.await {
                        Ok(_) => error!("{name} task completed!"),
                        Err(e) => error!("{name} task failed: {e:?}!"),
                    }
                })
            })
            .collect();

        // Wait for any task to complete. All handles are boxed, so when dropped they are cancelled.
        let (_, _, remaining) = futures::future::select_all(futures).await;
        drop(remaining);
    }

    fn start_http_server(config: HttpConfig, relay: RelayManager) -> Result<JoinHandle<()>> {
        let address = config.address;
        let tls_config = config.tls;

        let app = create_app(relay);
        let handle = tokio::spawn(async move {
            let result = match tls_config {
                Some(_tls_config) => {
                    #[cfg(any(feature = "tls-rustls", feature = "tls-native"))]
                    {
                        info!("Starting HTTPS (secure) server on {address}");

                        #[cfg(feature = "tls-rustls")]
                        {
                            let _ = rustls::crypto::CryptoProvider::install_default(
                                rustls::crypto::aws_lc_rs::default_provider(),
                            );
                            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            )
                            .await
                            .expect("Failed to load rustls TLS certificates!");
                            axum_server::bind_rustls(address, tls)
                                .serve(app.into_make_service())
                                .await
                                .map_err(anyhow::Error::from)
                        }

                        #[cfg(all(feature = "tls-native", not(feature = "tls-rustls")))]
                        {
                            let tls = axum_server::tls_openssl::OpenSSLConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            )
                            .expect("Failed to load openssl TLS certificates!");
                            axum_server::bind_openssl(address, tls)
                                .serve(app.into_make_service())
                                .await
                                .map_err(anyhow::Error::from)
                        }
                    }

                    #[cfg(not(any(feature = "tls-rustls", feature = "tls-native")))]
                    Err(anyhow::anyhow!(
                        "HTTP Server TLS configuration provided but no TLS features enabled. Compile with a TLS backend feature!"
                    ))
                }
                None => {
                    info!("Starting HTTP (insecure) server on {address}");
                    axum_server::bind(address)
                        .serve(app.into_make_service())
                        .await
                        .map_err(anyhow::Error::from)
                }
            };

            if let Err(e) = result {
                error!("Server error: {e:?}");
            }
        });

        Ok(handle)
    }
}
