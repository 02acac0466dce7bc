use crate::error::Error;
use crate::txt_store::{DynTxtStore, TxtStore};
use tracing::{debug, error};
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::client::op::{Header, LowerQuery, MessageType, OpCode, ResponseCode};
use trust_dns_server::client::rr::rdata::TXT;
use trust_dns_server::client::rr::{RData, Record, RecordType};
use trust_dns_server::proto::error::ProtoError;
use trust_dns_server::proto::serialize::binary::{BinEncodable, BinEncoder};
use trust_dns_server::server::{Protocol, Request, RequestHandler, ResponseHandler, ResponseInfo};

/// Longest character-string a single TXT chunk can carry on the wire.
const TXT_CHUNK_LEN: usize = 255;

/// Fixed size of a DNS message header.
const HEADER_LEN: usize = 12;

#[derive(Clone)]
pub struct Handler {
    txt_store: DynTxtStore,
    txt_ttl: u32,
}

impl Handler {
    pub(crate) fn new(txt_store: DynTxtStore, txt_ttl: u32) -> Self {
        Handler { txt_store, txt_ttl }
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response: R,
    ) -> Result<ResponseInfo, Error> {
        // If it isn't a query, return NOTIMPL.
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return self.handle_notimpl(request, response).await;
        }

        let records = self.answers(std::slice::from_ref(request.query()));
        if records.is_empty() {
            debug!("no answers for {}, returning NOERROR", request.src());
        }
        self.send_auth_resp(request, response, &records).await
    }

    /// Answer records for a set of questions. Only TXT questions for provisioned names produce an
    /// answer; everything else is skipped without error.
    pub(crate) fn answers(&self, queries: &[LowerQuery]) -> Vec<Record> {
        queries.iter().filter_map(|q| self.answer(q)).collect()
    }

    fn answer(&self, query: &LowerQuery) -> Option<Record> {
        if query.query_type() != RecordType::TXT {
            debug!("ignoring {} query for {}", query.query_type(), query.name());
            return None;
        }

        // Answers echo the name as asked, not its lower-cased form.
        let query_name = query.original().name();
        match self.txt_store.get_txt(&query_name.to_ascii()) {
            Some(value) => {
                debug!("returning TXT for {query_name}: {value}");
                Some(Record::from_rdata(
                    query_name.clone(),
                    self.txt_ttl,
                    RData::TXT(txt_rdata(&value)),
                ))
            }
            None => {
                debug!("no TXT record for {query_name}");
                None
            }
        }
    }

    async fn handle_notimpl<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let response = MessageResponseBuilder::from_message_request(request);
        Ok(response_handle
            .send_response(response.error_msg(request.header(), ResponseCode::NotImp))
            .await?)
    }

    async fn send_auth_resp<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        records: &[Record],
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_recursion_available(false);
        header.set_response_code(ResponseCode::NoError);

        // An oversized UDP answer goes out empty with TC set, so the client retries over TCP.
        let mut records = records;
        if matches!(request.protocol(), Protocol::Udp) {
            let max_payload = usize::from(request.max_payload());
            let len = response_len(request.query(), records)?;
            if len > max_payload {
                debug!(
                    "{len} byte answer for {} exceeds {max_payload}, truncating",
                    request.src()
                );
                header.set_truncated(true);
                records = &[];
            }
        }

        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, records.iter(), &[], &[], &[]);
        Ok(response_handle.send_response(response).await?)
    }
}

/// Encoded size of a response carrying `query` and `records`.
fn response_len(query: &LowerQuery, records: &[Record]) -> Result<usize, ProtoError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    query.original().emit(&mut encoder)?;
    for record in records {
        record.emit(&mut encoder)?;
    }
    Ok(HEADER_LEN + encoder.len())
}

/// TXT rdata for a stored value, split into as many character-strings as its length requires.
fn txt_rdata(value: &str) -> TXT {
    if value.is_empty() {
        return TXT::new(vec![String::new()]);
    }
    TXT::from_bytes(value.as_bytes().chunks(TXT_CHUNK_LEN).collect())
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                // Nothing was sent; the exchange is dropped.
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
