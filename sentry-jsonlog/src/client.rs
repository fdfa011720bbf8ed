use std::borrow::Cow;
use std::sync::Arc;

use sentry_core::types::Dsn;
use sentry_core::{ClientOptions, TransportFactory};
use url::Url;

use crate::error::Error;
use crate::options::WriterOptions;

/// Creates the options of the client owned by a writer.
pub(crate) fn client_options(
    options: &WriterOptions,
    dsn: Option<Dsn>,
) -> Result<ClientOptions, Error> {
    let http_proxy = options.http_proxy.clone().map(parse_proxy).transpose()?;
    let https_proxy = options.https_proxy.clone().map(parse_proxy).transpose()?;

    Ok(ClientOptions {
        dsn,
        debug: options.debug,
        release: options.release.clone(),
        environment: options.environment.clone(),
        server_name: options.server_name.clone(),
        traces_sample_rate: traces_sample_rate(options),
        http_proxy,
        https_proxy,
        transport: transport_factory(options)?,
        ..Default::default()
    })
}

fn traces_sample_rate(options: &WriterOptions) -> f32 {
    if options.tracing {
        options.traces_sample_rate.unwrap_or(1.0)
    } else {
        0.0
    }
}

fn parse_proxy(proxy: Cow<'static, str>) -> Result<Cow<'static, str>, Error> {
    match Url::parse(&proxy) {
        Ok(_) => Ok(proxy),
        Err(source) => Err(Error::InvalidProxy {
            url: proxy.into_owned(),
            source,
        }),
    }
}

fn transport_factory(options: &WriterOptions) -> Result<Option<Arc<dyn TransportFactory>>, Error> {
    if let Some(ref factory) = options.transport {
        return Ok(Some(factory.clone()));
    }
    default_transport_factory(options)
}

#[cfg(not(feature = "transport"))]
fn default_transport_factory(
    _options: &WriterOptions,
) -> Result<Option<Arc<dyn TransportFactory>>, Error> {
    Ok(None)
}

#[cfg(feature = "transport")]
fn default_transport_factory(
    options: &WriterOptions,
) -> Result<Option<Arc<dyn TransportFactory>>, Error> {
    use sentry::transports::DefaultTransportFactory;

    let client = match options.http_client {
        Some(ref client) => client.clone(),
        None if options.ca_certs.is_empty() => {
            return Ok(Some(Arc::new(DefaultTransportFactory)));
        }
        None => http_client(options)?,
    };
    Ok(Some(Arc::new(reqwest_transport::ReqwestTransportFactory {
        client,
    })))
}

/// Builds an HTTP client honoring the proxies and root certificates.
#[cfg(feature = "transport")]
fn http_client(options: &WriterOptions) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(ref url) = options.http_proxy {
        builder = builder.proxy(reqwest::Proxy::http(url.as_ref()).map_err(Error::HttpClient)?);
    }
    if let Some(ref url) = options.https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(url.as_ref()).map_err(Error::HttpClient)?);
    }
    for cert in &options.ca_certs {
        builder = builder.add_root_certificate(cert.clone());
    }
    builder.build().map_err(Error::HttpClient)
}

#[cfg(feature = "transport")]
mod reqwest_transport {
    use std::sync::Arc;

    use sentry::transports::ReqwestHttpTransport;
    use sentry_core::{ClientOptions, Transport, TransportFactory};

    /// Creates reqwest transports that share a preconfigured client.
    pub(super) struct ReqwestTransportFactory {
        pub(super) client: reqwest::Client,
    }

    impl TransportFactory for ReqwestTransportFactory {
        fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport> {
            Arc::new(ReqwestHttpTransport::with_client(
                options,
                self.client.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_writer_settings() {
        let options = WriterOptions::new()
            .release("app@1.0.0")
            .environment("production")
            .server_name("web-1")
            .debug(true);
        let client_options = client_options(&options, None).unwrap();

        assert_eq!(client_options.release.as_deref(), Some("app@1.0.0"));
        assert_eq!(client_options.environment.as_deref(), Some("production"));
        assert_eq!(client_options.server_name.as_deref(), Some("web-1"));
        assert!(client_options.debug);
        assert_eq!(client_options.sample_rate, 1.0);
    }

    #[test]
    fn traces_sample_rate_requires_tracing() {
        let options = WriterOptions::new().traces_sample_rate(0.5);
        assert_eq!(traces_sample_rate(&options), 0.0);

        let options = WriterOptions::new().tracing(true);
        assert_eq!(traces_sample_rate(&options), 1.0);

        let options = WriterOptions::new().tracing(true).traces_sample_rate(0.25);
        assert_eq!(traces_sample_rate(&options), 0.25);
    }

    #[test]
    fn validates_proxies() {
        let options = WriterOptions::new()
            .http_proxy("http://proxy.local:3128")
            .https_proxy("https://proxy.local:3129");
        let client_options = client_options(&options, None).unwrap();
        assert_eq!(
            client_options.http_proxy.as_deref(),
            Some("http://proxy.local:3128")
        );
        assert_eq!(
            client_options.https_proxy.as_deref(),
            Some("https://proxy.local:3129")
        );

        let options = WriterOptions::new().https_proxy("not a url");
        let err = super::client_options(&options, None).unwrap_err();
        assert!(matches!(err, Error::InvalidProxy { ref url, .. } if url == "not a url"));
    }
}
