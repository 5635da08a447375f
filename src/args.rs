use crate::config::NamedArgs;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Point a DNS A record at this machine's public IP", long_about = None)]
pub struct Args {
    /// DNS provider and its credentials (may come from --file instead)
    #[command(subcommand)]
    pub provider: Option<ProviderArgs>,

    /// Configuration file path
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Manually specify the IPv4 address instead of discovering it
    #[arg(long, global = true)]
    pub ip: Option<String>,

    /// Override the provider's API base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Timeout for provider API requests, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Public suffix list file used to find the apex domain
    #[arg(long, global = true)]
    pub suffix_list: Option<String>,

    /// Verbose output
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Debug output
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(long, global = true, default_value = "false")]
    pub quiet: bool,
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ProviderArgs {
    /// Alibaba Cloud DNS (signed query API)
    #[command(name = "aliyun")]
    Aliyun {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        domain: String,
    },
    /// Cloudflare (global API key)
    #[command(name = "cloudflare")]
    Cloudflare {
        #[arg(long)]
        email: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// CloudXNS dynamic DNS endpoint
    #[command(name = "cloudxns")]
    Cloudxns {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        domain: String,
    },
    /// DigitalOcean Domains
    #[command(name = "digitalocean")]
    Digitalocean {
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// DNSimple v2
    #[command(name = "dnsimple")]
    Dnsimple {
        /// Looked up with the token when omitted
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// DNSPod (dnsapi.cn)
    #[command(name = "dnspod")]
    Dnspod {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        domain: String,
    },
    /// Gandi LiveDNS
    #[command(name = "gandi")]
    Gandi {
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// GoDaddy
    #[command(name = "godaddy")]
    Godaddy {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        domain: String,
    },
    /// Hurricane Electric dynamic DNS
    #[command(name = "he")]
    He {
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// Linode v4
    #[command(name = "linode")]
    Linode {
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// Namecheap dynamic DNS
    #[command(name = "namecheap")]
    Namecheap {
        #[arg(long)]
        password: String,
        #[arg(long)]
        domain: String,
    },
    /// NS1
    #[command(name = "ns1")]
    Ns1 {
        #[arg(long)]
        key: String,
        #[arg(long)]
        domain: String,
    },
    /// Tencent Cloud DNS (signed query API)
    #[command(name = "qcloud")]
    Qcloud {
        #[arg(long)]
        secret_id: String,
        #[arg(long)]
        secret_key: String,
        #[arg(long)]
        domain: String,
    },
}

fn named(pairs: &[(&str, &String)]) -> NamedArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), (*v).clone()))
        .collect()
}

impl ProviderArgs {
    /// Provider name as accepted by `clients::create_client`
    pub fn name(&self) -> &'static str {
        match self {
            ProviderArgs::Aliyun { .. } => "aliyun",
            ProviderArgs::Cloudflare { .. } => "cloudflare",
            ProviderArgs::Cloudxns { .. } => "cloudxns",
            ProviderArgs::Digitalocean { .. } => "digitalocean",
            ProviderArgs::Dnsimple { .. } => "dnsimple",
            ProviderArgs::Dnspod { .. } => "dnspod",
            ProviderArgs::Gandi { .. } => "gandi",
            ProviderArgs::Godaddy { .. } => "godaddy",
            ProviderArgs::He { .. } => "he",
            ProviderArgs::Linode { .. } => "linode",
            ProviderArgs::Namecheap { .. } => "namecheap",
            ProviderArgs::Ns1 { .. } => "ns1",
            ProviderArgs::Qcloud { .. } => "qcloud",
        }
    }

    /// Arguments keyed by their names in the configuration map
    pub fn arguments(&self) -> NamedArgs {
        match self {
            ProviderArgs::Aliyun { key, secret, domain }
            | ProviderArgs::Cloudxns { key, secret, domain }
            | ProviderArgs::Godaddy { key, secret, domain } => {
                named(&[("key", key), ("secret", secret), ("domain", domain)])
            }
            ProviderArgs::Cloudflare { email, key, domain } => {
                named(&[("email", email), ("key", key), ("domain", domain)])
            }
            ProviderArgs::Digitalocean { key, domain }
            | ProviderArgs::Gandi { key, domain }
            | ProviderArgs::He { key, domain }
            | ProviderArgs::Linode { key, domain }
            | ProviderArgs::Ns1 { key, domain } => named(&[("key", key), ("domain", domain)]),
            ProviderArgs::Dnsimple {
                account_id,
                key,
                domain,
            } => {
                let mut args = named(&[("key", key), ("domain", domain)]);
                if let Some(account_id) = account_id {
                    args.insert("account_id".to_string(), account_id.clone());
                }
                args
            }
            ProviderArgs::Dnspod {
                email,
                password,
                domain,
            } => named(&[("email", email), ("password", password), ("domain", domain)]),
            ProviderArgs::Namecheap { password, domain } => {
                named(&[("password", password), ("domain", domain)])
            }
            ProviderArgs::Qcloud {
                secret_id,
                secret_key,
                domain,
            } => named(&[
                ("secret_id", secret_id),
                ("secret_key", secret_key),
                ("domain", domain),
            ]),
        }
    }
}
