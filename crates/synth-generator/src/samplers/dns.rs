//! DNS clients: an address and a diurnal stream of long-tailed lookups.
//!
//! Record `i` is client `i`. Its address is drawn from `field / "clients" /
//! i / "ip"` and its queries come from diurnal entity `i`, replayed over the
//! whole `[start, end]` window. The domain process is shared by all
//! clients, so popular domains stay popular across the table.

use super::bursts::time_fields;
use super::{DomainSampler, Sampler};
use crate::diurnal::{DiurnalActivityStateMachine, DiurnalConfig, HyperParameters};
use crate::generator::GeneratorError;
use crate::seed_tree::SeedNode;
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use synth_core::{DnsConfig, FieldMap, SampledValue, TimeFormat};

/// Share of IPv6 clients whose address has bytes 2..8 zeroed.
const SPARSE_V6_PROB: f64 = 0.1;

/// IPv4 with probability `v4_prob`, otherwise IPv6.
pub fn random_ip<R: Rng>(rng: &mut R, v4_prob: f64) -> IpAddr {
    if rng.random::<f64>() < v4_prob {
        let mut bytes = [0u8; 4];
        rng.fill(&mut bytes);
        IpAddr::V4(Ipv4Addr::from(bytes))
    } else {
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        if rng.random::<f64>() < SPARSE_V6_PROB {
            bytes[2..8].fill(0);
        }
        IpAddr::V6(Ipv6Addr::from(bytes))
    }
}

/// Address bytes as lowercase hex, two digits per byte.
pub fn hex_address(ip: &IpAddr) -> String {
    let bytes = match ip {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    };
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug)]
pub struct DnsSampler {
    config: DnsConfig,
    hyper: HyperParameters,
    clients: SeedNode,
    domains: DomainSampler,
    format: TimeFormat,
}

impl DnsSampler {
    pub fn new(config: &DnsConfig, node: SeedNode, path: &str) -> Result<Self, GeneratorError> {
        let resolved = config.resolve(path)?;
        let hyper = HyperParameters::new(DiurnalConfig::from_resolved(
            &resolved,
            &config.timeline(),
        ))?;
        let domains = DomainSampler::new(
            config.alpha,
            config.discount,
            config.vocabulary.as_deref(),
            &node.child("domains"),
        )?;
        Ok(Self {
            config: config.clone(),
            hyper,
            clients: node.child("clients"),
            domains,
            format: resolved.format,
        })
    }

    fn retain(&self, fields: &mut FieldMap) {
        fields.retain(|name, _| self.config.keeps(name));
    }

    fn client_fields(&self, index: u64) -> FieldMap {
        let mut rng = self.clients.child(index).child("ip").random_generator();
        let ip = random_ip(&mut rng, self.config.v4_prob);

        let mut fields = FieldMap::new();
        fields.insert("ip".to_string(), ip.to_string().into());
        fields.insert("ipx".to_string(), hex_address(&ip).into());
        fields.insert("ip_v4".to_string(), ip.is_ipv4().into());
        self.retain(&mut fields);
        fields
    }

    /// Every query of client `index`, in time order.
    fn queries(&mut self, index: u64) -> Result<Vec<FieldMap>, GeneratorError> {
        let mut machine =
            DiurnalActivityStateMachine::for_entity(self.hyper.clone(), self.clients.clone(), index);
        let mut steps = 0u64;
        let mut queries = Vec::new();
        while let Some(t) = machine.next_action(&mut steps)? {
            let mut query = match self.domains.sample(index)? {
                SampledValue::Object(fields) => fields,
                _ => FieldMap::new(),
            };
            query.extend(time_fields(&self.format, t));
            self.retain(&mut query);
            queries.push(query);
        }
        Ok(queries)
    }
}

impl Sampler for DnsSampler {
    fn sample(&mut self, index: u64) -> Result<SampledValue, GeneratorError> {
        let client = self.client_fields(index);
        let queries = self.queries(index)?;

        if self.config.flatten {
            let rows = queries
                .into_iter()
                .map(|query| {
                    let mut row = client.clone();
                    row.extend(query);
                    SampledValue::Object(row)
                })
                .collect();
            return Ok(SampledValue::Array(rows));
        }

        let mut record = client;
        record.insert(
            "queries".to_string(),
            SampledValue::Array(queries.into_iter().map(SampledValue::Object).collect()),
        );
        Ok(SampledValue::Object(record))
    }
}
